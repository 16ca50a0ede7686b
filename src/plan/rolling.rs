//! Rolling re-planning: plan, execute the first hour, observe, plan again.

use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::PlanError;

use super::planner::Planner;
use super::types::{HourlyInput, PlanRow};

/// Outcome of a rolling run over a horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingOutcome {
    /// The first row of each successive plan, i.e. what was executed.
    pub executed: Vec<PlanRow>,
    /// Battery level each plan started from.
    pub start_levels: Vec<f64>,
}

/// Level to seed the next plan with after executing `executed`.
///
/// The plan's own expectation for the next hour is used as is, except for
/// an equalizing hour: the battery then also covered (or absorbed) the
/// difference between actual and expected consumption, never going below
/// `min_capacity`.
pub fn next_start_level(
    executed: &PlanRow,
    expected_next: f64,
    expected_consumption: f64,
    actual_consumption: f64,
    min_capacity: f64,
) -> f64 {
    if executed.action.is_equalize() {
        let deviation = actual_consumption - expected_consumption;
        (expected_next - deviation).max(min_capacity)
    } else {
        expected_next
    }
}

/// Re-plans once per hour over a shrinking horizon.
///
/// Hour `i` is planned from `forecast[i..]` starting at the level carried
/// over from hour `i - 1`; only its first row is kept. Each iteration builds
/// a fresh configuration instead of mutating a shared one.
///
/// # Arguments
///
/// * `config` - Base configuration; its `initial_level` seeds hour 0
/// * `forecast` - Hourly inputs for the whole horizon
/// * `actual_consumption` - Observed consumption per hour
///
/// # Errors
///
/// Returns [`PlanError::ActualLengthMismatch`] if the two series differ in
/// length, or any error of [`Planner::new`] / [`Planner::plan`].
pub fn replan_rolling(
    config: &PlannerConfig,
    forecast: &[HourlyInput],
    actual_consumption: &[f64],
) -> Result<RollingOutcome, PlanError> {
    if forecast.len() != actual_consumption.len() {
        return Err(PlanError::ActualLengthMismatch {
            expected: forecast.len(),
            actual: actual_consumption.len(),
        });
    }
    if forecast.is_empty() {
        return Err(PlanError::EmptyHorizon);
    }

    let mut level = config.initial_level;
    let mut outcome = RollingOutcome {
        executed: Vec::with_capacity(forecast.len()),
        start_levels: Vec::with_capacity(forecast.len()),
    };

    for (hour, actual) in actual_consumption.iter().enumerate() {
        let planner = Planner::new(config.with_initial_level(level))?;
        let plan = planner.plan(&forecast[hour..])?;
        let Some(executed) = plan.rows.first().cloned() else {
            return Err(PlanError::EmptyHorizon);
        };

        outcome.start_levels.push(level);
        if let Some(next) = plan.rows.get(1) {
            level = next_start_level(
                &executed,
                next.battery_expected,
                forecast[hour].expected_consumption,
                *actual,
                config.min_capacity,
            );
        }
        debug!(hour, action = %executed.action, next_level = level, "executed hour");
        outcome.executed.push(executed);
    }

    Ok(outcome)
}
