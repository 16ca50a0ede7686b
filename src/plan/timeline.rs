//! The mutable plan table the repair phases work on.

use crate::config::PlannerConfig;
use crate::error::Infeasible;

use super::types::{Action, ActionReason, HourlyInput, Plan, PlanRow, Violation};

/// Price column used to order candidate hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceColumn {
    Price,
    SpotPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Hourly plan under construction.
///
/// Holds one [`PlanRow`] per input hour. Inputs and configuration are
/// borrowed and never change; cloning a timeline copies only the rows, which
/// is what speculative amendments rely on.
#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    pub(super) inputs: &'a [HourlyInput],
    pub(super) config: &'a PlannerConfig,
    pub(super) rows: Vec<PlanRow>,
}

impl<'a> Timeline<'a> {
    /// Creates an all-idle table with zeroed derived fields.
    ///
    /// Call [`Timeline::initialize`] to run the greedy pass before any
    /// repair phase.
    pub fn new(inputs: &'a [HourlyInput], config: &'a PlannerConfig) -> Self {
        let rows = inputs
            .iter()
            .map(|input| PlanRow {
                time: input.time,
                action: Action::Idle,
                solar_surplus: 0.0,
                battery_delta: 0.0,
                battery_expected: 0.0,
                solar_export: 0.0,
                reason: ActionReason::Idle,
            })
            .collect();
        Self {
            inputs,
            config,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the final hour. Callers guarantee a non-empty table.
    pub fn last_index(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn rows(&self) -> &[PlanRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &PlanRow {
        &self.rows[index]
    }

    fn column_value(&self, index: usize, column: PriceColumn) -> f64 {
        let input = &self.inputs[index];
        match column {
            PriceColumn::Price => input.price,
            PriceColumn::SpotPrice => input.spot_price,
        }
    }

    /// Orders hour indices by a price column.
    ///
    /// Sorting operates on `(index, value)` pairs so the original positions
    /// survive. The sort is stable: equal prices keep ascending hour order
    /// in both directions.
    pub fn sorted_indices(
        &self,
        indices: impl IntoIterator<Item = usize>,
        column: PriceColumn,
        order: SortOrder,
    ) -> Vec<usize> {
        let mut keyed: Vec<(usize, f64)> = indices
            .into_iter()
            .map(|i| (i, self.column_value(i, column)))
            .collect();
        match order {
            SortOrder::Ascending => keyed.sort_by(|a, b| a.1.total_cmp(&b.1)),
            SortOrder::Descending => keyed.sort_by(|a, b| b.1.total_cmp(&a.1)),
        }
        keyed.into_iter().map(|(i, _)| i).collect()
    }

    /// Hours storing a solar surplus (`equalize` with positive surplus).
    pub fn solar_charging_hours(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.is_solar_charging(i))
            .collect()
    }

    pub fn is_solar_charging(&self, index: usize) -> bool {
        let row = &self.rows[index];
        row.action.is_equalize() && row.solar_surplus > 0.0
    }

    /// Runs `op` on a copy of the table.
    ///
    /// On success the amended copy is returned and the caller decides
    /// whether to adopt it; on failure the copy is dropped and `self` is
    /// exactly as before.
    pub fn try_amend<F>(&self, op: F) -> Result<Timeline<'a>, Infeasible>
    where
        F: FnOnce(&mut Timeline<'a>) -> Result<(), Infeasible>,
    {
        let mut candidate = self.clone();
        op(&mut candidate)?;
        Ok(candidate)
    }

    pub fn into_plan(self, violations: Vec<Violation>) -> Plan {
        Plan {
            rows: self.rows,
            violations,
        }
    }
}
