//! Reads hourly planner inputs from CSV.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::plan::HourlyInput;

/// Column header expected in input files.
pub const HEADER: &str = "Time,Price,SpotPrice,Power,ExpectedConsumption";

#[derive(Debug, Error)]
#[error("cannot read inputs from \"{}\": {source}", .path.display())]
pub struct InputError {
    pub path: PathBuf,
    #[source]
    pub source: csv::Error,
}

/// Reads input rows from a CSV file.
///
/// # Errors
///
/// Returns an [`InputError`] if the file cannot be opened or a row does not
/// parse.
pub fn read_inputs(path: &Path) -> Result<Vec<HourlyInput>, InputError> {
    let wrap = |source| InputError {
        path: path.to_path_buf(),
        source,
    };
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(wrap)?;
    collect_rows(reader).map_err(wrap)
}

/// Reads input rows from any CSV source with a [`HEADER`] line.
///
/// # Errors
///
/// Returns a `csv::Error` on malformed rows.
pub fn read_inputs_from(reader: impl Read) -> Result<Vec<HourlyInput>, csv::Error> {
    collect_rows(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader))
}

fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<HourlyInput>, csv::Error> {
    reader.deserialize().collect()
}
