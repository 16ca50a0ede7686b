//! Forward simulation of battery levels and the action setters that keep
//! derived fields consistent.

use super::timeline::Timeline;
use super::types::{Action, ActionReason};

/// Slack on the per-hour rate bound to absorb float noise from `rate - delta`.
const RATE_EPSILON: f64 = 1e-9;

/// Rounds a kWh value to 4 decimals.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// How much extra grid charge an hour can take.
///
/// `min` is non-zero only when the hour is discharging (`equalize` with a
/// negative delta): any charge below it merely cancels the discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeSwing {
    pub min: f64,
    pub max: f64,
}

impl Timeline<'_> {
    fn compute_solar_surplus(&mut self, index: usize) {
        let input = &self.inputs[index];
        self.rows[index].solar_surplus = round4(input.power - input.expected_consumption);
    }

    fn compute_battery_delta(&mut self, index: usize) {
        let rate = self.config.max_charge_rate;
        let row = &mut self.rows[index];
        let surplus = row.solar_surplus;
        row.battery_delta = match row.action {
            Action::Idle => 0.0,
            Action::Equalize => surplus.min(rate),
            Action::Charge { net_charge } if surplus < 0.0 => net_charge,
            Action::Charge { net_charge } => surplus.min(rate) + net_charge,
        };
    }

    fn compute_expected_level(&mut self, index: usize) {
        self.rows[index].battery_expected = if index == 0 {
            self.config.initial_level
        } else {
            let prev = &self.rows[index - 1];
            round4(prev.battery_expected + prev.battery_delta)
        };
    }

    fn compute_solar_export(&mut self, index: usize) {
        let rate = self.config.max_charge_rate;
        let row = &mut self.rows[index];
        let surplus = row.solar_surplus;
        row.solar_export = match row.action {
            Action::Idle => surplus.max(0.0),
            Action::Equalize if surplus > rate => surplus - rate,
            Action::Equalize | Action::Charge { .. } => 0.0,
        };
    }

    /// Recomputes every derived field of one hour from scratch.
    pub(super) fn recompute_hour(&mut self, index: usize) {
        self.compute_solar_surplus(index);
        self.compute_battery_delta(index);
        self.compute_expected_level(index);
        self.compute_solar_export(index);
    }

    /// Refreshes the delta and export of `index` and re-simulates every later
    /// level. Earlier levels are unaffected by a change at `index`.
    fn refresh_from(&mut self, index: usize) {
        self.compute_battery_delta(index);
        self.compute_solar_export(index);
        for i in index + 1..self.rows.len() {
            self.compute_expected_level(i);
        }
    }

    /// Sets the action and reason of an hour and propagates the change.
    pub fn set_action(&mut self, index: usize, action: Action, reason: ActionReason) {
        let row = &mut self.rows[index];
        row.action = action;
        row.reason = reason;
        self.refresh_from(index);
    }

    pub fn set_reason(&mut self, index: usize, reason: ActionReason) {
        self.rows[index].reason = reason;
    }

    /// Adds `amount` kWh of grid charge to an hour.
    ///
    /// Returns `false` and leaves the table untouched when the amount is
    /// negative or would push the hour past the charge rate. The reason is
    /// left to the caller.
    ///
    /// A discharging hour first absorbs the charge into its discharge: if
    /// the amount does not cover the discharge the hour simply turns idle.
    pub fn set_charge(&mut self, index: usize, amount: f64) -> bool {
        let rate = self.config.max_charge_rate;
        let row = &self.rows[index];
        let delta = row.battery_delta;

        let within_rate = match row.action {
            Action::Idle => amount >= 0.0 && amount <= rate + RATE_EPSILON,
            _ => amount >= 0.0 && amount + delta <= rate + RATE_EPSILON,
        };
        if !within_rate {
            return false;
        }

        let action = match row.action {
            Action::Idle => Action::Charge { net_charge: amount },
            Action::Charge { net_charge } => Action::Charge {
                net_charge: net_charge + amount,
            },
            Action::Equalize if delta < 0.0 && delta.abs() > amount => Action::Idle,
            Action::Equalize if delta < 0.0 => Action::Charge {
                net_charge: amount + delta,
            },
            Action::Equalize => Action::Charge { net_charge: amount },
        };
        self.rows[index].action = action;
        self.refresh_from(index);
        true
    }

    /// Extra grid charge the hour can take in its current state.
    pub fn charge_swing(&self, index: usize) -> ChargeSwing {
        let rate = self.config.max_charge_rate;
        let row = &self.rows[index];
        let delta = row.battery_delta;
        match row.action {
            Action::Equalize if delta < 0.0 => ChargeSwing {
                min: delta.abs(),
                max: rate + delta.abs(),
            },
            Action::Equalize if delta > 0.0 => ChargeSwing {
                min: 0.0,
                max: rate - delta,
            },
            Action::Charge { .. } => ChargeSwing {
                min: 0.0,
                max: rate - delta,
            },
            Action::Idle | Action::Equalize => ChargeSwing {
                min: 0.0,
                max: rate,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures;

    #[test]
    fn round4_rounds_half_away() {
        assert_eq!(round4(1.23456), 1.2346);
        assert_eq!(round4(-0.00004), -0.0);
        assert_eq!(round4(2.0), 2.0);
    }

    #[test]
    fn equalize_delta_is_capped_by_rate_only_when_charging() {
        let inputs = fixtures::inputs(&[1.0, 1.0], &[0.5, 0.5], &[6.0, 0.0], &[1.0, 2.0]);
        let config = fixtures::config();
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();
        tl.set_action(1, Action::Equalize, ActionReason::EqualizeUseBattery);

        assert_eq!(tl.row(0).battery_delta, 3.0);
        assert_eq!(tl.row(0).solar_export, 2.0);
        assert_eq!(tl.row(1).battery_delta, -2.0);
        assert_eq!(tl.row(1).solar_export, 0.0);
    }

    #[test]
    fn idle_exports_positive_surplus() {
        let inputs = fixtures::inputs(&[1.0, 1.0], &[0.5, 0.5], &[2.5, 0.0], &[1.0, 1.0]);
        let config = fixtures::config();
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();
        tl.set_action(0, Action::Idle, ActionReason::IdleSolarOverflow);

        assert_eq!(tl.row(0).battery_delta, 0.0);
        assert_eq!(tl.row(0).solar_export, 1.5);
        assert_eq!(tl.row(1).solar_export, 0.0);
    }

    #[test]
    fn levels_follow_recurrence_after_change() {
        let inputs = fixtures::flat_inputs(5, 1.0, 0.5, 0.0, 1.0);
        let config = fixtures::config().with_initial_level(5.0);
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();
        tl.set_action(2, Action::Equalize, ActionReason::EqualizeUseBattery);

        let levels: Vec<f64> = tl.rows().iter().map(|r| r.battery_expected).collect();
        assert_eq!(levels, vec![5.0, 5.0, 5.0, 4.0, 4.0]);
    }

    #[test]
    fn charge_on_idle_sets_net_charge() {
        let inputs = fixtures::flat_inputs(3, 1.0, 0.5, 0.0, 1.0);
        let config = fixtures::config();
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();

        assert!(tl.set_charge(0, 2.0));
        assert_eq!(tl.row(0).action, Action::Charge { net_charge: 2.0 });
        assert_eq!(tl.row(0).battery_delta, 2.0);
        assert_eq!(tl.row(1).battery_expected, 2.0);
    }

    #[test]
    fn charge_accumulates_up_to_rate() {
        let inputs = fixtures::flat_inputs(3, 1.0, 0.5, 0.0, 1.0);
        let config = fixtures::config();
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();

        assert!(tl.set_charge(0, 1.0));
        assert!(tl.set_charge(0, 1.5));
        assert_eq!(tl.row(0).el_net_charge(), 2.5);
        assert!(!tl.set_charge(0, 1.0));
        assert_eq!(tl.row(0).el_net_charge(), 2.5);
    }

    #[test]
    fn charge_rejects_negative_and_oversized_amounts() {
        let inputs = fixtures::flat_inputs(2, 1.0, 0.5, 0.0, 1.0);
        let config = fixtures::config();
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();

        assert!(!tl.set_charge(0, -0.5));
        assert!(!tl.set_charge(0, 3.5));
        assert!(tl.row(0).action.is_idle());
    }

    #[test]
    fn small_charge_on_discharging_hour_turns_idle() {
        let inputs = fixtures::flat_inputs(3, 1.0, 0.5, 0.0, 2.0);
        let config = fixtures::config().with_initial_level(5.0);
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();
        tl.set_action(0, Action::Equalize, ActionReason::EqualizeUseBattery);
        assert_eq!(tl.row(1).battery_expected, 3.0);

        assert!(tl.set_charge(0, 1.0));
        assert_eq!(tl.row(0).action, Action::Idle);
        assert_eq!(tl.row(0).el_net_charge(), 0.0);
        assert_eq!(tl.row(1).battery_expected, 5.0);
    }

    #[test]
    fn large_charge_on_discharging_hour_swings_to_charge() {
        let inputs = fixtures::flat_inputs(3, 1.0, 0.5, 0.0, 2.0);
        let config = fixtures::config().with_initial_level(5.0);
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();
        tl.set_action(0, Action::Equalize, ActionReason::EqualizeUseBattery);

        let swing = tl.charge_swing(0);
        assert_eq!(swing, ChargeSwing { min: 2.0, max: 5.0 });

        assert!(tl.set_charge(0, 3.5));
        assert_eq!(tl.row(0).action, Action::Charge { net_charge: 1.5 });
        assert_eq!(tl.row(1).battery_expected, 6.5);
    }

    #[test]
    fn charge_on_solar_hour_adds_to_stored_surplus() {
        let inputs = fixtures::inputs(&[1.0, 1.0], &[0.5, 0.5], &[2.0, 0.0], &[1.0, 1.0]);
        let config = fixtures::config();
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();
        assert_eq!(tl.charge_swing(0), ChargeSwing { min: 0.0, max: 2.0 });

        assert!(tl.set_charge(0, 2.0));
        assert_eq!(tl.row(0).battery_delta, 3.0);
        assert_eq!(tl.row(0).solar_export, 0.0);
        assert!(!tl.set_charge(0, 0.5));
    }

    #[test]
    fn switching_away_from_charge_drops_net_charge() {
        let inputs = fixtures::flat_inputs(2, 1.0, 0.5, 0.0, 1.0);
        let config = fixtures::config();
        let mut tl = Timeline::new(&inputs, &config);
        tl.initialize();
        assert!(tl.set_charge(0, 2.0));

        tl.set_action(0, Action::Idle, ActionReason::IdleDefault);
        assert_eq!(tl.row(0).el_net_charge(), 0.0);
        assert_eq!(tl.row(1).battery_expected, 0.0);
    }
}
