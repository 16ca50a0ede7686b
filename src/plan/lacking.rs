//! Repairs levels projected below the minimum by buying cheaper grid
//! energy earlier in the horizon.

use tracing::{debug, warn};

use crate::error::Infeasible;

use super::simulate::ChargeSwing;
use super::timeline::{PriceColumn, SortOrder, Timeline};
use super::types::{ActionReason, Violation};
use super::violation::is_covered;

/// A buy hour must beat the reference hour by more than this price index.
pub const PRICE_INDEX_THRESHOLD: i64 = 10;

/// Profitability of buying at `buy_price` to avoid buying at `use_price`,
/// in hundredths of the price unit after round-trip losses.
pub fn price_index(use_price: f64, buy_price: f64, effectivity: f64) -> i64 {
    ((use_price * effectivity - buy_price) * 100.0).floor() as i64
}

/// Picks how much to charge at one hour.
///
/// `swing` is what the hour can take, `headroom` the room left under the
/// maximum capacity over the affected window, and `needed` the energy
/// still missing. Returns zero when charging here cannot help.
pub fn decide_charge_amount(swing: ChargeSwing, headroom: f64, needed: f64) -> f64 {
    if headroom > needed {
        if swing.max >= needed {
            if needed > swing.min {
                needed
            } else if swing.min > headroom {
                0.0
            } else {
                swing.min
            }
        } else {
            swing.max
        }
    } else if swing.max > headroom {
        if swing.min > headroom { 0.0 } else { headroom }
    } else {
        swing.max
    }
}

impl Timeline<'_> {
    /// Covers a shortfall by charging cheaper hours before it.
    ///
    /// Candidates lie between the last hour at or above the maximum and the
    /// violation, excluding `reference`, cheapest first. Only hours whose
    /// price index against the reference hour exceeds
    /// [`PRICE_INDEX_THRESHOLD`] are charged.
    ///
    /// Returns the energy still missing; see [`is_covered`].
    pub fn fix_lacking(&mut self, reference: usize, violation: Violation) -> f64 {
        let max = self.config.max_capacity;
        let effectivity = self.config.battery_effectivity;
        let reference_price = self.inputs[reference].price;
        let v = violation.index;
        let mut remaining = violation.amount_kwh;

        let max_point = (1..v)
            .rev()
            .find(|&x| self.rows[x].battery_expected >= max)
            .unwrap_or(0);
        let candidates = self.sorted_indices(
            (max_point..v).filter(|&i| i != reference),
            PriceColumn::Price,
            SortOrder::Ascending,
        );

        for hour in candidates {
            let index = price_index(reference_price, self.inputs[hour].price, effectivity);
            if index > PRICE_INDEX_THRESHOLD {
                let headroom = max - self.max_level_between(hour, v);
                let amount = decide_charge_amount(self.charge_swing(hour), headroom, remaining);
                if amount > 0.0 && self.set_charge(hour, amount) {
                    self.set_reason(hour, ActionReason::ChargeLaterConsumption);
                    remaining -= amount;
                    debug!(hour, amount_kwh = amount, price_index = index, "charging for later use");
                }
            }
            if is_covered(remaining) {
                break;
            }
        }
        remaining
    }

    /// Repeats [`Timeline::fix_lacking`] for every shortfall from
    /// `reference` onward.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] as soon as a shortfall cannot be covered.
    pub fn resolve_lacking(&mut self, reference: usize) -> Result<(), Infeasible> {
        // Charging only raises levels, so each round moves the first
        // shortfall strictly forward.
        for _ in 0..=self.rows.len() {
            let Some(violation) = self.scan_below(reference) else {
                return Ok(());
            };
            let remaining = self.fix_lacking(reference, violation);
            if !is_covered(remaining) {
                return Err(Infeasible {
                    index: violation.index,
                    amount_kwh: remaining,
                });
            }
        }
        self.scan_below(reference).map_or(Ok(()), |v| Err(v.into()))
    }

    /// Charges from hour 0 onward, regardless of price, until the buffer
    /// shortfall is covered.
    ///
    /// Used when the horizon starts below the minimum.
    pub fn refill_buffer_immediately(&mut self, violation: Violation) {
        let max = self.config.max_capacity;
        let mut needed = violation.amount_kwh;
        let mut hour = 0;

        while !is_covered(needed) && hour < self.rows.len() {
            let headroom = max - self.rows[hour].battery_expected;
            let amount = decide_charge_amount(self.charge_swing(hour), headroom, needed);
            if amount > 0.0 && self.set_charge(hour, amount) {
                self.set_reason(hour, ActionReason::ChargeLaterConsumption);
                needed -= amount;
                debug!(hour, amount_kwh = amount, needed_kwh = needed, "refilling buffer");
            }
            hour += 1;
        }

        if !is_covered(needed) {
            warn!(needed_kwh = needed, "horizon too short to refill buffer");
        }
    }
}
