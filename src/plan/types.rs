//! Core data types for the hourly battery plan.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One hour of forecast input for the planner.
///
/// Prices are per kWh, energies are kWh over the hour. Rows are expected
/// in ascending time order; the planner never reorders them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HourlyInput {
    /// Start of the hour.
    pub time: NaiveDateTime,
    /// Consumer buy price for grid energy.
    pub price: f64,
    /// Wholesale sell price for exported energy (may be negative).
    pub spot_price: f64,
    /// Forecast solar production.
    pub power: f64,
    /// Forecast household consumption.
    pub expected_consumption: f64,
}

impl HourlyInput {
    /// Creates a new input row.
    pub fn new(
        time: NaiveDateTime,
        price: f64,
        spot_price: f64,
        power: f64,
        expected_consumption: f64,
    ) -> Self {
        Self {
            time,
            price,
            spot_price,
            power,
            expected_consumption,
        }
    }
}

/// Battery behaviour for one hour.
///
/// `Charge` carries the grid energy drawn into the battery on top of any
/// solar surplus. The other variants carry nothing, so an idle hour can
/// never hold a stale net charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Battery untouched; surplus exported, deficit bought.
    Idle,
    /// Battery charged from the grid (plus solar surplus up to the rate).
    Charge {
        /// Grid energy charged this hour (kWh).
        net_charge: f64,
    },
    /// Battery follows the household: stores surplus or covers deficit.
    Equalize,
}

impl Action {
    /// Lowercase action name as written in exported plans.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Charge { .. } => "charge",
            Self::Equalize => "equalize",
        }
    }

    /// Grid net charge of this action, zero for anything but `Charge`.
    pub fn net_charge(&self) -> f64 {
        match self {
            Self::Charge { net_charge } => *net_charge,
            Self::Idle | Self::Equalize => 0.0,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_charge(&self) -> bool {
        matches!(self, Self::Charge { .. })
    }

    pub fn is_equalize(&self) -> bool {
        matches!(self, Self::Equalize)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Why the planner chose the action of an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionReason {
    Idle,
    IdleDefault,
    IdleSolarOverflow,
    IdleSolarSellHighBuyLow,
    EqualizeUseBattery,
    EqualizeSolarCharge,
    ChargeLaterConsumption,
}

impl ActionReason {
    /// Human-readable description shown to users.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting For Next Action",
            Self::IdleDefault => "No Cheap Power Or High Consumption",
            Self::IdleSolarOverflow => "Selling Excess SolPower",
            Self::IdleSolarSellHighBuyLow => "Selling SolPower At High SpotPrice",
            Self::EqualizeUseBattery => "Equalizing With Cheap Power",
            Self::EqualizeSolarCharge => "Charging Expected SolPower Surplus",
            Self::ChargeLaterConsumption => "Charging Cheap GridPower",
        }
    }
}

impl fmt::Display for ActionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One planned hour.
///
/// `battery_expected` is the level at the start of the hour;
/// `battery_delta` is the change applied during it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRow {
    pub time: NaiveDateTime,
    pub action: Action,
    /// `power - expected_consumption`, rounded to 4 decimals.
    pub solar_surplus: f64,
    pub battery_delta: f64,
    pub battery_expected: f64,
    pub solar_export: f64,
    pub reason: ActionReason,
}

impl PlanRow {
    /// Grid energy charged into the battery this hour.
    pub fn el_net_charge(&self) -> f64 {
        self.action.net_charge()
    }

    /// Level at the end of the hour.
    pub fn level_after(&self) -> f64 {
        self.battery_expected + self.battery_delta
    }
}

impl fmt::Display for PlanRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {:<8} | surplus={:>7.3}  net={:>6.3}  delta={:>7.3}  \
             level={:>7.3}  export={:>6.3} | {}",
            self.time.format("%Y-%m-%d %H:%M"),
            self.action,
            self.solar_surplus,
            self.el_net_charge(),
            self.battery_delta,
            self.battery_expected,
            self.solar_export,
            self.reason,
        )
    }
}

/// Which capacity bound a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    AboveMaximum,
    BelowMinimum,
}

/// A projected level outside `[min_capacity, max_capacity]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Violation {
    /// Hour whose projected level breaks the bound.
    pub index: usize,
    pub kind: ViolationKind,
    /// Excess above the maximum or shortfall below the minimum (kWh, positive).
    pub amount_kwh: f64,
}

impl Violation {
    pub fn above(index: usize, amount_kwh: f64) -> Self {
        Self {
            index,
            kind: ViolationKind::AboveMaximum,
            amount_kwh,
        }
    }

    pub fn below(index: usize, amount_kwh: f64) -> Self {
        Self {
            index,
            kind: ViolationKind::BelowMinimum,
            amount_kwh,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::AboveMaximum => write!(
                f,
                "hour {}: {:.4} kWh above maximum capacity",
                self.index, self.amount_kwh
            ),
            ViolationKind::BelowMinimum => write!(
                f,
                "hour {}: {:.4} kWh below minimum capacity",
                self.index, self.amount_kwh
            ),
        }
    }
}

/// A finished plan: one row per input hour plus whatever the final
/// validation could not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub rows: Vec<PlanRow>,
    pub violations: Vec<Violation>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when the final validation found nothing to report.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midnight() -> NaiveDateTime {
        NaiveDateTime::default()
    }

    #[test]
    fn net_charge_only_on_charge() {
        assert_eq!(Action::Idle.net_charge(), 0.0);
        assert_eq!(Action::Equalize.net_charge(), 0.0);
        assert_eq!(Action::Charge { net_charge: 1.5 }.net_charge(), 1.5);
    }

    #[test]
    fn action_names_are_lowercase() {
        assert_eq!(Action::Idle.to_string(), "idle");
        assert_eq!(Action::Charge { net_charge: 2.0 }.to_string(), "charge");
        assert_eq!(Action::Equalize.to_string(), "equalize");
    }

    #[test]
    fn reason_descriptions() {
        assert_eq!(
            ActionReason::IdleDefault.to_string(),
            "No Cheap Power Or High Consumption"
        );
        assert_eq!(
            ActionReason::ChargeLaterConsumption.description(),
            "Charging Cheap GridPower"
        );
        assert_eq!(
            ActionReason::IdleSolarSellHighBuyLow.description(),
            "Selling SolPower At High SpotPrice"
        );
    }

    #[test]
    fn plan_row_display_does_not_panic() {
        let row = PlanRow {
            time: midnight(),
            action: Action::Charge { net_charge: 1.25 },
            solar_surplus: -0.5,
            battery_delta: 1.25,
            battery_expected: 3.0,
            solar_export: 0.0,
            reason: ActionReason::ChargeLaterConsumption,
        };
        let s = format!("{row}");
        assert!(s.contains("charge"));
        assert!(s.contains("Charging Cheap GridPower"));
        assert_eq!(row.level_after(), 4.25);
    }

    #[test]
    fn violation_display_names_hour() {
        let v = Violation::below(7, 1.5);
        assert!(v.to_string().starts_with("hour 7"));
        assert_eq!(v.kind, ViolationKind::BelowMinimum);
    }
}
