//! Solar surplus decisions: export what is not needed, and sell at a high
//! spot price when the energy can be bought back cheaper.

use tracing::debug;

use crate::config::SolarStrategy;
use crate::error::Infeasible;

use super::lacking::decide_charge_amount;
use super::timeline::{PriceColumn, SortOrder, Timeline};
use super::types::{Action, ActionReason};
use super::violation::is_covered;

impl Timeline<'_> {
    /// Exports stored surplus that the rest of the horizon never needs.
    ///
    /// Only acts under [`SolarStrategy::SellAll`]; with `SaveAll` every
    /// surplus stays in the battery.
    pub fn sell_timeframe_surplus(&mut self) {
        let min = self.config.min_capacity;
        let rate = self.config.max_charge_rate;
        let last = self.last_index();
        let candidates = self.sorted_indices(
            self.solar_charging_hours(),
            PriceColumn::SpotPrice,
            SortOrder::Descending,
        );

        for hour in candidates {
            if !self.is_solar_charging(hour) {
                continue;
            }
            let to_bottom = if hour < last {
                self.min_level_between(hour + 1, last) - min
            } else {
                rate
            };
            let stored = self.rows[hour].battery_delta;
            if to_bottom < stored {
                continue;
            }
            match self.config.solar_strategy {
                SolarStrategy::SellAll => {
                    self.set_action(hour, Action::Idle, ActionReason::IdleSolarOverflow);
                    debug!(hour, stored_kwh = stored, "exporting unneeded surplus");
                }
                SolarStrategy::SaveAll => {
                    debug!(hour, stored_kwh = stored, "keeping unneeded surplus");
                }
            }
        }
    }

    /// Sells surplus at a high spot price and buys the energy back in
    /// cheaper hours.
    ///
    /// Surplus hours are tried by descending spot price. Buy hours before
    /// the sale are searched cheapest first, then hours after it; the
    /// search stops at the first hour whose price is not below the spot
    /// price. A sale is adopted only if the full amount is bought back and
    /// the plan stays within capacity from the earliest buy hour on. The
    /// pass ends at the first sale for which no hour is cheap enough.
    pub fn sell_or_use_surplus(&mut self) {
        let last = self.last_index();
        let candidates = self.sorted_indices(
            self.solar_charging_hours(),
            PriceColumn::SpotPrice,
            SortOrder::Descending,
        );

        for sell in candidates {
            if !self.is_solar_charging(sell) {
                continue;
            }
            let mut any_cheaper = false;
            let attempt = self.try_amend(|copy| {
                let mut needed = copy.rows[sell].battery_delta;
                let mut first_buy = sell;
                copy.set_action(sell, Action::Idle, ActionReason::IdleSolarSellHighBuyLow);

                let before = copy.sorted_indices(0..sell, PriceColumn::Price, SortOrder::Ascending);
                any_cheaper |= copy.buy_back(sell, &before, &mut needed, &mut first_buy);
                if !is_covered(needed) && sell < last {
                    let after = copy.sorted_indices(
                        sell + 1..=last,
                        PriceColumn::Price,
                        SortOrder::Ascending,
                    );
                    any_cheaper |= copy.buy_back(sell, &after, &mut needed, &mut first_buy);
                }

                if !is_covered(needed) {
                    return Err(Infeasible {
                        index: sell,
                        amount_kwh: needed,
                    });
                }
                match copy.scan_above(first_buy).or_else(|| copy.scan_below(first_buy)) {
                    Some(violation) => Err(violation.into()),
                    None => Ok(()),
                }
            });

            match attempt {
                Ok(amended) => {
                    *self = amended;
                    debug!(hour = sell, "selling surplus at spot price");
                }
                Err(err) => debug!(hour = sell, %err, "surplus kept"),
            }
            if !any_cheaper {
                break;
            }
        }
    }

    /// Charges buy hours (in the given order) until `needed` is covered.
    ///
    /// Returns whether any hour was cheaper than the sell hour's spot price.
    fn buy_back(
        &mut self,
        sell: usize,
        buy_hours: &[usize],
        needed: &mut f64,
        first_buy: &mut usize,
    ) -> bool {
        let spot = self.inputs[sell].spot_price;
        let max = self.config.max_capacity;
        let mut any_cheaper = false;

        for &buy in buy_hours {
            if spot <= self.inputs[buy].price {
                break;
            }
            any_cheaper = true;
            *first_buy = (*first_buy).min(buy);

            let headroom = max - self.max_level_between(buy, sell);
            let amount = decide_charge_amount(self.charge_swing(buy), headroom, *needed);
            if amount > 0.0 && self.set_charge(buy, amount) {
                self.set_reason(buy, ActionReason::ChargeLaterConsumption);
                *needed -= amount;
            }
            if is_covered(*needed) {
                break;
            }
        }
        any_cheaper
    }
}
