//! Holds the current plan for concurrent readers.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PlanError;
use crate::plan::{HourlyInput, Plan, Planner};

/// The most recently completed plan.
///
/// A refresh computes the new plan without holding the lock and swaps it
/// in afterwards, so readers never see a half-built table and are never
/// blocked by planning.
#[derive(Debug, Default)]
pub struct PlanStore {
    current: RwLock<Option<Arc<Plan>>>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current plan, if one has been published.
    pub fn current(&self) -> Option<Arc<Plan>> {
        self.current.read().clone()
    }

    /// Replaces the current plan and returns the shared handle.
    pub fn publish(&self, plan: Plan) -> Arc<Plan> {
        let plan = Arc::new(plan);
        *self.current.write() = Some(Arc::clone(&plan));
        plan
    }

    /// Plans `inputs` and publishes the result.
    ///
    /// # Errors
    ///
    /// Returns the planner's error; the previous plan then stays current.
    pub fn refresh(&self, planner: &Planner, inputs: &[HourlyInput]) -> Result<Arc<Plan>, PlanError> {
        let plan = planner.plan(inputs)?;
        Ok(self.publish(plan))
    }

    /// Like [`PlanStore::refresh`], but only publishes a plan without
    /// capacity violations.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnresolvedViolations`] for an infeasible plan,
    /// which is never published.
    pub fn refresh_strict(
        &self,
        planner: &Planner,
        inputs: &[HourlyInput],
    ) -> Result<Arc<Plan>, PlanError> {
        let plan = planner.plan_strict(inputs)?;
        Ok(self.publish(plan))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::plan::fixtures;

    #[test]
    fn empty_until_published() {
        let store = PlanStore::new();
        assert!(store.current().is_none());
    }

    #[test]
    fn refresh_publishes_plan() {
        let store = PlanStore::new();
        let inputs = fixtures::flat_inputs(4, 1.0, 0.5, 0.0, 1.0);
        let planner = Planner::new(fixtures::config());
        let published = planner.and_then(|p| store.refresh(&p, &inputs));
        assert!(published.is_ok());
        assert_eq!(store.current().map(|p| p.len()), Some(4));
    }

    #[test]
    fn failed_refresh_keeps_previous_plan() {
        let store = PlanStore::new();
        let inputs = fixtures::flat_inputs(4, 1.0, 0.5, 0.0, 1.0);
        let Ok(planner) = Planner::new(fixtures::config()) else {
            panic!("fixture config must be valid");
        };
        assert!(store.refresh(&planner, &inputs).is_ok());
        assert!(store.refresh(&planner, &[]).is_err());
        assert_eq!(store.current().map(|p| p.len()), Some(4));
    }

    #[test]
    fn strict_refresh_never_publishes_violating_plan() {
        let store = PlanStore::new();
        let inputs = fixtures::flat_inputs(4, 1.0, 0.5, 0.0, 1.0);
        let mut config = fixtures::config();
        config.min_capacity = 1.0;
        let (Ok(feasible), Ok(below_buffer)) = (
            Planner::new(fixtures::config()),
            Planner::new(config),
        ) else {
            panic!("fixture configs must be valid");
        };

        assert!(store.refresh_strict(&feasible, &inputs).is_ok());
        let before = store.current();
        let result = store.refresh_strict(&below_buffer, &inputs);
        assert!(matches!(result, Err(PlanError::UnresolvedViolations(_))));
        assert_eq!(store.current(), before);
    }

    #[test]
    fn readers_see_complete_plans_while_refreshing() {
        let store = Arc::new(PlanStore::new());
        let Ok(planner) = Planner::new(fixtures::config()) else {
            panic!("fixture config must be valid");
        };
        let short = fixtures::flat_inputs(6, 1.0, 0.5, 0.0, 1.0);
        let long = fixtures::flat_inputs(12, 1.0, 0.5, 0.0, 1.0);
        assert!(store.refresh(&planner, &short).is_ok());

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..200)
                    .filter_map(|_| store.current())
                    .all(|plan| plan.len() == 6 || plan.len() == 12)
            })
        };
        for _ in 0..20 {
            assert!(store.refresh(&planner, &long).is_ok());
            assert!(store.refresh(&planner, &short).is_ok());
        }
        assert!(reader.join().unwrap_or(false));
    }
}
