//! Error types surfaced by the planner.

use thiserror::Error;

use crate::config::ConfigError;
use crate::plan::types::Violation;

/// Errors returned by [`crate::plan::Planner`] and the re-planning helpers.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid planner configuration: {}", join(.0))]
    InvalidConfig(Vec<ConfigError>),

    #[error("input horizon is empty")]
    EmptyHorizon,

    #[error("input row {index} has a non-finite {field}")]
    NonFiniteInput { index: usize, field: &'static str },

    #[error("expected {expected} actual consumption values, got {actual}")]
    ActualLengthMismatch { expected: usize, actual: usize },

    #[error("plan left {} capacity violation(s): {}", .0.len(), join(.0))]
    UnresolvedViolations(Vec<Violation>),
}

/// A speculative amendment that could not be completed.
///
/// Only used inside the planner; a failed amendment is discarded and the
/// table it was tried on stays untouched.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("amendment infeasible at hour {index}: {amount_kwh:.4} kWh unresolved")]
pub struct Infeasible {
    pub index: usize,
    pub amount_kwh: f64,
}

impl From<Violation> for Infeasible {
    fn from(v: Violation) -> Self {
        Self {
            index: v.index,
            amount_kwh: v.amount_kwh,
        }
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
