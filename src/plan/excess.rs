//! Repairs levels projected above the maximum capacity.

use tracing::{debug, warn};

use super::timeline::{PriceColumn, SortOrder, Timeline};
use super::types::{Action, ActionReason, Violation};

impl Timeline<'_> {
    /// Repeats [`Timeline::fix_excess`] until no level exceeds the maximum
    /// or a round changes nothing.
    pub fn resolve_excess(&mut self) {
        while let Some(violation) = self.scan_above(0) {
            if self.fix_excess(violation) == 0 {
                warn!(
                    hour = violation.index,
                    excess_kwh = violation.amount_kwh,
                    "no hour left to absorb excess energy"
                );
                break;
            }
        }
    }

    /// Lowers the level at `violation.index` by using stored energy earlier.
    ///
    /// Works back to the last hour at or below the minimum (the zero point)
    /// and, within that window, first lets idle deficit hours discharge
    /// (most expensive first), then stops storing solar surplus (highest
    /// spot price first). A hour is only changed if every affected level up
    /// to the violation stays at or above the minimum.
    ///
    /// Returns the number of hours changed.
    pub fn fix_excess(&mut self, violation: Violation) -> usize {
        let min = self.config.min_capacity;
        let v = violation.index;
        let mut remaining = violation.amount_kwh;
        let mut changed = 0;

        let zero_point = (1..v)
            .rev()
            .find(|&x| self.rows[x].battery_expected <= min)
            .unwrap_or(0);

        let deficit_hours = self.sorted_indices(
            (zero_point..v).filter(|&i| {
                let row = &self.rows[i];
                row.action.is_idle() && row.solar_surplus < 0.0
            }),
            PriceColumn::Price,
            SortOrder::Descending,
        );
        for hour in deficit_hours {
            let draw = self.rows[hour].solar_surplus.abs();
            if self.min_level_between(hour + 1, v) - min >= draw {
                self.set_action(hour, Action::Equalize, ActionReason::EqualizeUseBattery);
                remaining -= draw;
                changed += 1;
                debug!(hour, draw_kwh = draw, remaining_kwh = remaining, "discharging to absorb excess");
            }
            if remaining <= 0.0 {
                return changed;
            }
        }

        let solar_hours = self.sorted_indices(
            (zero_point..v).filter(|&i| self.is_solar_charging(i)),
            PriceColumn::SpotPrice,
            SortOrder::Descending,
        );
        for hour in solar_hours {
            let stored = self.rows[hour].battery_delta;
            if self.min_level_between(hour + 1, v) - min >= stored {
                self.set_action(hour, Action::Idle, ActionReason::IdleSolarOverflow);
                remaining -= stored;
                changed += 1;
                debug!(hour, stored_kwh = stored, remaining_kwh = remaining, "exporting surplus to absorb excess");
            }
            if remaining <= 0.0 {
                break;
            }
        }

        changed
    }
}
