//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use battery_planner::config::{PlannerConfig, SolarStrategy};
use battery_planner::plan::{HourlyInput, Plan, Planner};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Start of every fixture horizon.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or_default()
}

/// 10 kWh battery, 3 kWh/h, no buffer, 90% round trip, empty, save all.
pub fn config() -> PlannerConfig {
    PlannerConfig {
        max_charge_rate: 3.0,
        max_capacity: 10.0,
        min_capacity: 0.0,
        battery_effectivity: 0.9,
        solar_strategy: SolarStrategy::SaveAll,
        initial_level: 0.0,
    }
}

/// Same prices, solar and consumption every hour.
pub fn flat_inputs(
    hours: usize,
    price: f64,
    spot_price: f64,
    power: f64,
    consumption: f64,
) -> Vec<HourlyInput> {
    (0..hours)
        .map(|i| {
            HourlyInput::new(
                start() + TimeDelta::hours(i as i64),
                price,
                spot_price,
                power,
                consumption,
            )
        })
        .collect()
}

/// Inputs from per-hour columns of equal length.
pub fn inputs(
    prices: &[f64],
    spot_prices: &[f64],
    power: &[f64],
    consumption: &[f64],
) -> Vec<HourlyInput> {
    (0..prices.len())
        .map(|i| {
            HourlyInput::new(
                start() + TimeDelta::hours(i as i64),
                prices[i],
                spot_prices[i],
                power[i],
                consumption[i],
            )
        })
        .collect()
}

/// Plans `inputs` with `config`, panicking with the error on failure.
pub fn plan(config: PlannerConfig, inputs: &[HourlyInput]) -> Plan {
    match Planner::new(config).and_then(|p| p.plan(inputs)) {
        Ok(plan) => plan,
        Err(e) => panic!("planning failed: {e}"),
    }
}

/// Projected level at the start of each hour.
pub fn levels(plan: &Plan) -> Vec<f64> {
    plan.rows.iter().map(|r| r.battery_expected).collect()
}

/// Flat day with a single 5 kWh solar surplus at hour 10.
pub fn single_surplus_day() -> Vec<HourlyInput> {
    let mut inputs = flat_inputs(24, 1.0, 0.5, 0.0, 1.0);
    inputs[10].power = 6.0;
    inputs
}
