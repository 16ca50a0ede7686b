//! Rolling re-planning and the shared plan store.

mod common;

use std::sync::Arc;

use battery_planner::PlanError;
use battery_planner::plan::{Planner, replan_rolling};
use battery_planner::store::PlanStore;

#[test]
fn rolling_with_exact_forecast_matches_single_plan() {
    let mut config = common::config();
    config.max_capacity = 8.0;
    let inputs = common::single_surplus_day();
    let single = common::plan(config.clone(), &inputs);

    let actual: Vec<f64> = inputs.iter().map(|i| i.expected_consumption).collect();
    let outcome = replan_rolling(&config, &inputs, &actual);
    assert!(outcome.is_ok(), "rolling failed: {:?}", outcome.as_ref().err());
    let Ok(outcome) = outcome else { return };

    assert_eq!(outcome.executed.len(), 24);
    for (executed, planned) in outcome.executed.iter().zip(&single.rows) {
        assert_eq!(executed.action, planned.action, "hour {}", planned.time);
    }
    assert_eq!(outcome.start_levels, common::levels(&single));
}

#[test]
fn higher_actual_consumption_drains_equalizing_battery() {
    let mut config = common::config();
    config.max_capacity = 8.0;
    let inputs = common::single_surplus_day();
    let mut actual: Vec<f64> = inputs.iter().map(|i| i.expected_consumption).collect();
    actual[11] = 1.5;

    let outcome = replan_rolling(&config, &inputs, &actual);
    let levels = outcome.map(|o| o.start_levels).unwrap_or_default();
    assert_eq!(levels[11], 3.0);
    assert_eq!(levels[12], 1.5);
}

#[test]
fn rolling_rejects_mismatched_actuals() {
    let inputs = common::flat_inputs(4, 1.0, 0.5, 0.0, 1.0);
    let result = replan_rolling(&common::config(), &inputs, &[1.0]);
    assert!(matches!(result, Err(PlanError::ActualLengthMismatch { .. })));
}

#[test]
fn store_serves_latest_plan() {
    let store = Arc::new(PlanStore::new());
    let planner = Planner::new(common::config());
    assert!(planner.is_ok());
    let Ok(planner) = planner else { return };

    let day = common::flat_inputs(24, 1.0, 0.5, 0.0, 1.0);
    let half = common::flat_inputs(12, 1.0, 0.5, 0.0, 1.0);
    assert!(store.refresh(&planner, &day).is_ok());
    assert_eq!(store.current().map(|p| p.len()), Some(24));
    assert!(store.refresh(&planner, &half).is_ok());
    assert_eq!(store.current().map(|p| p.len()), Some(12));
}
