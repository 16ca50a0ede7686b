//! Greedy first pass: store every solar surplus, otherwise stay idle.

use tracing::debug;

use super::simulate::round4;
use super::timeline::Timeline;
use super::types::{Action, ActionReason};

impl Timeline<'_> {
    /// Assigns the initial action of every hour and simulates levels.
    ///
    /// Hours with a positive surplus equalize (the battery absorbs the
    /// surplus up to the charge rate); all other hours are idle.
    pub fn initialize(&mut self) {
        for index in 0..self.rows.len() {
            let input = &self.inputs[index];
            let (action, reason) = if round4(input.power - input.expected_consumption) > 0.0 {
                (Action::Equalize, ActionReason::EqualizeSolarCharge)
            } else {
                (Action::Idle, ActionReason::IdleDefault)
            };
            let row = &mut self.rows[index];
            row.action = action;
            row.reason = reason;
            self.recompute_hour(index);
        }
        debug!(
            hours = self.rows.len(),
            solar_hours = self.solar_charging_hours().len(),
            "greedy pass complete"
        );
    }
}
