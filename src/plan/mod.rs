//! Hourly battery planning: data types, the plan table and the phases
//! that build and repair it.

pub mod excess;
pub mod greedy;
pub mod lacking;
pub mod peak;
pub mod planner;
pub mod rolling;
pub mod simulate;
pub mod solar;
pub mod summary;
pub mod timeline;
pub mod types;
pub mod violation;

pub use planner::Planner;
pub use rolling::{RollingOutcome, replan_rolling};
pub use summary::PlanSummary;
pub use timeline::Timeline;
pub use types::{Action, ActionReason, HourlyInput, Plan, PlanRow, Violation, ViolationKind};
