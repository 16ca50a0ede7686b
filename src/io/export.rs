//! CSV and JSON export of finished plans.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::plan::{Plan, PlanRow, PlanSummary};

/// Column header of exported plan CSV files.
const HEADER: &str = "Time,Action,SolarSurplus,ElNetCharge,BatteryDelta,\
                      BatteryExpected,SolarExport,ActionReason";

/// One plan row as written to JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanRecord {
    pub time: NaiveDateTime,
    pub action: &'static str,
    pub solar_surplus: f64,
    pub el_net_charge: f64,
    pub battery_delta: f64,
    pub battery_expected: f64,
    pub solar_export: f64,
    pub action_reason: &'static str,
}

impl From<&PlanRow> for PlanRecord {
    fn from(row: &PlanRow) -> Self {
        Self {
            time: row.time,
            action: row.action.name(),
            solar_surplus: row.solar_surplus,
            el_net_charge: row.el_net_charge(),
            battery_delta: row.battery_delta,
            battery_expected: row.battery_expected,
            solar_export: row.solar_export,
            action_reason: row.reason.description(),
        }
    }
}

#[derive(Serialize)]
struct PlanDocument<'a> {
    plan: Vec<PlanRecord>,
    summary: &'a PlanSummary,
}

/// Exports a plan to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(plan: &Plan, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(plan, io::BufWriter::new(file))
}

/// Writes a plan as CSV to any writer, numbers with 4 decimals.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(plan: &Plan, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;
    for r in &plan.rows {
        wtr.write_record(&[
            r.time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            r.action.name().to_string(),
            format!("{:.4}", r.solar_surplus),
            format!("{:.4}", r.el_net_charge()),
            format!("{:.4}", r.battery_delta),
            format!("{:.4}", r.battery_expected),
            format!("{:.4}", r.solar_export),
            r.reason.description().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the plan rows and summary as pretty-printed JSON.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization or writing fails.
pub fn write_json(
    plan: &Plan,
    summary: &PlanSummary,
    writer: impl Write,
) -> Result<(), serde_json::Error> {
    let document = PlanDocument {
        plan: plan.rows.iter().map(PlanRecord::from).collect(),
        summary,
    };
    serde_json::to_writer_pretty(writer, &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures;
    use crate::plan::{Action, ActionReason};

    fn make_plan(hours: usize) -> Plan {
        let rows = (0..hours)
            .map(|i| PlanRow {
                time: NaiveDateTime::default() + chrono::TimeDelta::hours(i as i64),
                action: Action::Charge { net_charge: 1.5 },
                solar_surplus: -0.25,
                battery_delta: 1.5,
                battery_expected: i as f64 * 1.5,
                solar_export: 0.0,
                reason: ActionReason::ChargeLaterConsumption,
            })
            .collect();
        Plan {
            rows,
            violations: Vec::new(),
        }
    }

    fn csv_output(plan: &Plan) -> String {
        let mut buf = Vec::new();
        write_csv(plan, &mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_matches_columns() {
        let output = csv_output(&make_plan(1));
        assert_eq!(
            output.lines().next().unwrap_or(""),
            "Time,Action,SolarSurplus,ElNetCharge,BatteryDelta,\
             BatteryExpected,SolarExport,ActionReason"
        );
    }

    #[test]
    fn row_count_matches_hours() {
        let output = csv_output(&make_plan(24));
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn row_values_formatted() {
        let output = csv_output(&make_plan(2));
        let second = output.lines().nth(2).unwrap_or("");
        assert_eq!(
            second,
            "1970-01-01T01:00:00,charge,-0.2500,1.5000,1.5000,1.5000,0.0000,Charging Cheap GridPower"
        );
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir();
        assert!(dir.is_ok());
        let Ok(dir) = dir else { return };
        let path = dir.path().join("plan.csv");
        assert!(export_csv(&make_plan(3), &path).is_ok());
        let written = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(written.lines().count(), 4);
    }

    #[test]
    fn json_contains_plan_and_summary() {
        let plan = make_plan(2);
        let inputs = fixtures::flat_inputs(2, 1.0, 0.5, 0.0, 0.25);
        let summary = PlanSummary::from_plan(&plan, &inputs, &fixtures::config());
        let mut buf = Vec::new();
        assert!(write_json(&plan, &summary, &mut buf).is_ok());

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap_or_default();
        assert_eq!(value["plan"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["plan"][0]["Action"], "charge");
        assert_eq!(value["plan"][0]["ElNetCharge"], 1.5);
        assert_eq!(value["summary"]["charge_hours"], 2);
    }
}
