//! CSV input and CSV/JSON plan output.

pub mod export;
pub mod input;
