//! Runs the planning phases in order.

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::PlanError;

use super::timeline::Timeline;
use super::types::{HourlyInput, Plan};

/// Builds hourly battery plans for a fixed configuration.
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    /// Creates a planner after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] listing every invalid field.
    pub fn new(config: PlannerConfig) -> Result<Self, PlanError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(PlanError::InvalidConfig(errors));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans one action per input hour.
    ///
    /// Phases: greedy pass, immediate refill when starting below the
    /// buffer, excess repair, peak equalizing, surplus export, surplus
    /// arbitrage. Violations the phases could not resolve are logged and
    /// returned in [`Plan::violations`]; the plan is still usable.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Hourly forecast rows in time order
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::EmptyHorizon`] for no input rows and
    /// [`PlanError::NonFiniteInput`] for NaN or infinite values.
    pub fn plan(&self, inputs: &[HourlyInput]) -> Result<Plan, PlanError> {
        validate_inputs(inputs)?;

        let mut timeline = Timeline::new(inputs, &self.config);
        timeline.initialize();
        if let Some(shortfall) = timeline.scan_below(0) {
            timeline.refill_buffer_immediately(shortfall);
        }
        timeline.resolve_excess();
        timeline.equalize_peaks();
        timeline.sell_timeframe_surplus();
        timeline.sell_or_use_surplus();

        let violations = timeline.violations();
        for violation in &violations {
            warn!(%violation, "unresolved capacity violation");
        }
        let plan = timeline.into_plan(violations);
        info!(
            hours = plan.len(),
            charge = plan.rows.iter().filter(|r| r.action.is_charge()).count(),
            equalize = plan.rows.iter().filter(|r| r.action.is_equalize()).count(),
            violations = plan.violations.len(),
            "plan ready"
        );
        Ok(plan)
    }

    /// Like [`Planner::plan`], but unresolved violations are an error.
    ///
    /// # Errors
    ///
    /// Everything [`Planner::plan`] returns, plus
    /// [`PlanError::UnresolvedViolations`].
    pub fn plan_strict(&self, inputs: &[HourlyInput]) -> Result<Plan, PlanError> {
        let plan = self.plan(inputs)?;
        if plan.is_feasible() {
            Ok(plan)
        } else {
            Err(PlanError::UnresolvedViolations(plan.violations))
        }
    }
}

fn validate_inputs(inputs: &[HourlyInput]) -> Result<(), PlanError> {
    if inputs.is_empty() {
        return Err(PlanError::EmptyHorizon);
    }
    for (index, input) in inputs.iter().enumerate() {
        let fields = [
            ("price", input.price),
            ("spot_price", input.spot_price),
            ("power", input.power),
            ("expected_consumption", input.expected_consumption),
        ];
        if let Some((field, _)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(PlanError::NonFiniteInput { index, field });
        }
    }
    Ok(())
}
