//! Uses the battery in the most expensive deficit hours.

use tracing::debug;

use crate::error::Infeasible;

use super::timeline::{PriceColumn, SortOrder, Timeline};
use super::types::{Action, ActionReason};

impl Timeline<'_> {
    /// Switches idle deficit hours to `equalize`, most expensive first.
    ///
    /// An hour equalizes outright when the battery holds enough above the
    /// minimum for the rest of the horizon. Otherwise the switch is tried on
    /// a copy together with cheaper earlier charging to cover the resulting
    /// shortfall, and adopted only if every shortfall could be covered.
    pub fn equalize_peaks(&mut self) {
        let order = self.sorted_indices(0..self.len(), PriceColumn::Price, SortOrder::Descending);
        for hour in order {
            let row = &self.rows[hour];
            if !row.action.is_idle() || row.solar_surplus >= 0.0 {
                continue;
            }
            if self.equalize_possible(hour) {
                self.set_action(hour, Action::Equalize, ActionReason::EqualizeUseBattery);
                debug!(hour, "equalizing from stored energy");
                continue;
            }
            match self.try_amend(|copy| copy.equalize_with_charge(hour)) {
                Ok(amended) => {
                    *self = amended;
                    debug!(hour, "equalizing with earlier grid charge");
                }
                Err(err) => debug!(hour, %err, "peak hour stays idle"),
            }
        }
    }

    fn equalize_possible(&self, hour: usize) -> bool {
        let available = self.min_level_between(hour, self.last_index()) - self.config.min_capacity;
        available >= self.rows[hour].solar_surplus.abs()
    }

    fn equalize_with_charge(&mut self, hour: usize) -> Result<(), Infeasible> {
        self.set_action(hour, Action::Equalize, ActionReason::EqualizeUseBattery);
        self.resolve_lacking(hour)
    }
}
