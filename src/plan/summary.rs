//! Post-hoc statistics derived from a finished plan.

use std::fmt;

use serde::Serialize;

use crate::config::PlannerConfig;

use super::simulate::round4;
use super::types::{Action, HourlyInput, Plan, PlanRow};

/// Expected state of charge in percent of capacity, 4 decimals.
pub fn expected_soc_pct(level_kwh: f64, capacity_kwh: f64) -> f64 {
    if capacity_kwh <= 0.0 {
        return 0.0;
    }
    round4(level_kwh * 100.0 / capacity_kwh)
}

/// Grid energy bought during the hour (consumption deficit plus net charge).
pub fn grid_import_kwh(row: &PlanRow) -> f64 {
    let deficit = (-row.solar_surplus).max(0.0);
    match row.action {
        Action::Idle => deficit,
        Action::Equalize => 0.0,
        Action::Charge { net_charge } => deficit + net_charge,
    }
}

/// Cost of the hour under the plan: imports at the consumer price minus
/// exports at the spot price. Exports at a negative spot price earn nothing.
pub fn planned_cost(row: &PlanRow, input: &HourlyInput) -> f64 {
    grid_import_kwh(row) * input.price - row.solar_export * input.spot_price.max(0.0)
}

/// Cost of the hour when all consumption is bought from the grid.
pub fn normal_cost(input: &HourlyInput) -> f64 {
    input.expected_consumption * input.price
}

/// Aggregate figures of a complete plan.
///
/// Computed post-hoc from the plan rows and the inputs they were planned
/// from, so the report never disagrees with the table.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    /// Number of planned hours.
    pub hours: usize,
    pub idle_hours: usize,
    pub charge_hours: usize,
    pub equalize_hours: usize,
    /// Total grid energy charged into the battery (kWh).
    pub grid_charge_kwh: f64,
    /// Total grid energy bought (kWh).
    pub grid_import_kwh: f64,
    /// Total solar energy exported (kWh).
    pub solar_export_kwh: f64,
    /// Lowest projected level (kWh).
    pub min_level_kwh: f64,
    /// Highest projected level (kWh).
    pub max_level_kwh: f64,
    /// Level after the final hour (kWh).
    pub final_level_kwh: f64,
    /// Expected state of charge at the start of the next hour (%).
    pub next_hour_soc_pct: f64,
    /// Cost of buying all consumption from the grid.
    pub normal_cost: f64,
    /// Cost under the plan.
    pub planned_cost: f64,
    /// `normal_cost - planned_cost`, 2 decimals.
    pub expected_profit: f64,
    /// Profit of the first hour alone, 2 decimals.
    pub first_hour_profit: f64,
    /// Capacity violations the planner could not resolve.
    pub unresolved_violations: usize,
}

impl PlanSummary {
    /// Computes all figures from a plan and the inputs it was built from.
    ///
    /// # Arguments
    ///
    /// * `plan` - Finished plan
    /// * `inputs` - The hourly inputs passed to the planner
    /// * `config` - Configuration the plan was built with
    pub fn from_plan(plan: &Plan, inputs: &[HourlyInput], config: &PlannerConfig) -> Self {
        let mut summary = Self {
            hours: plan.len(),
            idle_hours: 0,
            charge_hours: 0,
            equalize_hours: 0,
            grid_charge_kwh: 0.0,
            grid_import_kwh: 0.0,
            solar_export_kwh: 0.0,
            min_level_kwh: 0.0,
            max_level_kwh: 0.0,
            final_level_kwh: 0.0,
            next_hour_soc_pct: 0.0,
            normal_cost: 0.0,
            planned_cost: 0.0,
            expected_profit: 0.0,
            first_hour_profit: 0.0,
            unresolved_violations: plan.violations.len(),
        };
        let (Some(first), Some(last)) = (plan.rows.first(), plan.rows.last()) else {
            return summary;
        };

        let mut min_level = f64::INFINITY;
        let mut max_level = f64::NEG_INFINITY;
        for (row, input) in plan.rows.iter().zip(inputs) {
            match row.action {
                Action::Idle => summary.idle_hours += 1,
                Action::Charge { .. } => summary.charge_hours += 1,
                Action::Equalize => summary.equalize_hours += 1,
            }
            summary.grid_charge_kwh += row.el_net_charge();
            summary.grid_import_kwh += grid_import_kwh(row);
            summary.solar_export_kwh += row.solar_export;
            min_level = min_level.min(row.battery_expected);
            max_level = max_level.max(row.battery_expected);
            summary.normal_cost += normal_cost(input);
            summary.planned_cost += planned_cost(row, input);
        }

        let next_level = plan
            .rows
            .get(1)
            .map_or_else(|| first.level_after(), |r| r.battery_expected);
        summary.min_level_kwh = min_level;
        summary.max_level_kwh = max_level;
        summary.final_level_kwh = round4(last.level_after());
        summary.next_hour_soc_pct = expected_soc_pct(next_level, config.max_capacity);
        summary.expected_profit = round2(summary.normal_cost - summary.planned_cost);
        summary.first_hour_profit = inputs
            .first()
            .map_or(0.0, |input| round2(normal_cost(input) - planned_cost(first, input)));
        summary
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Plan Summary ---")?;
        writeln!(
            f,
            "Hours:                 {} (idle {}, charge {}, equalize {})",
            self.hours, self.idle_hours, self.charge_hours, self.equalize_hours
        )?;
        writeln!(f, "Grid charge:           {:.2} kWh", self.grid_charge_kwh)?;
        writeln!(f, "Grid import:           {:.2} kWh", self.grid_import_kwh)?;
        writeln!(f, "Solar export:          {:.2} kWh", self.solar_export_kwh)?;
        writeln!(
            f,
            "Battery level:         {:.2}..{:.2} kWh, final {:.2} kWh",
            self.min_level_kwh, self.max_level_kwh, self.final_level_kwh
        )?;
        writeln!(f, "Next hour SoC:         {:.1}%", self.next_hour_soc_pct)?;
        writeln!(
            f,
            "Cost:                  {:.2} planned vs {:.2} normal",
            self.planned_cost, self.normal_cost
        )?;
        writeln!(
            f,
            "Expected profit:       {:.2} (first hour {:.2})",
            self.expected_profit, self.first_hour_profit
        )?;
        write!(f, "Unresolved violations: {}", self.unresolved_violations)
    }
}
