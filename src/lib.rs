//! Hourly charge/discharge/idle planning for a home battery next to a
//! solar installation.
//!
//! [`plan::Planner`] turns hourly price, spot price, solar and consumption
//! forecasts into one action per hour (`idle`, `charge` or `equalize`),
//! keeping the projected battery level between the configured buffer and
//! capacity.

pub mod config;
pub mod error;
pub mod io;
pub mod plan;
pub mod profile;
pub mod store;
pub mod telemetry;

pub use config::{PlannerConfig, Settings, SolarStrategy};
pub use error::PlanError;
pub use plan::{Plan, Planner};
