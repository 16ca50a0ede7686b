//! Planner configuration: the immutable [`PlannerConfig`] the algorithm
//! runs on, and the TOML [`Settings`] file it is built from.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with a solar surplus that the battery could absorb but does
/// not need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarStrategy {
    /// Export every surplus hour whose storage is not needed later.
    SellAll,
    /// Keep surplus in the battery.
    #[default]
    SaveAll,
}

impl SolarStrategy {
    /// Human-readable name.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SellAll => "Sell All",
            Self::SaveAll => "Save All",
        }
    }
}

/// Battery and strategy parameters for one planning run.
///
/// Built once per run and never mutated while planning; re-planning from a
/// new start level goes through [`PlannerConfig::with_initial_level`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Maximum energy into the battery per hour (kWh).
    pub max_charge_rate: f64,
    /// Usable battery capacity (kWh).
    pub max_capacity: f64,
    /// Minimum buffer that must stay in the battery (kWh).
    pub min_capacity: f64,
    /// Round-trip efficiency used by the price index, in `(0, 1]`.
    pub battery_effectivity: f64,
    pub solar_strategy: SolarStrategy,
    /// Battery level at the start of hour 0 (kWh).
    pub initial_level: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        BatterySettings::default().planner_config(SolarStrategy::default())
    }
}

impl PlannerConfig {
    /// Returns a copy seeded with a different hour-0 level.
    pub fn with_initial_level(&self, initial_level: f64) -> Self {
        Self {
            initial_level,
            ..self.clone()
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Field paths use
    /// the TOML names of [`BatterySettings`].
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let numbers = [
            ("battery.max_rate", self.max_charge_rate),
            ("battery.capacity", self.max_capacity),
            ("battery.threshold", self.min_capacity),
            ("battery.effectivity", self.battery_effectivity),
            ("battery.default_start_level", self.initial_level),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be a finite number"));
            }
        }

        if self.max_charge_rate <= 0.0 {
            errors.push(ConfigError::new("battery.max_rate", "must be > 0"));
        }
        if self.max_capacity <= 0.0 {
            errors.push(ConfigError::new("battery.capacity", "must be > 0"));
        }
        if self.min_capacity < 0.0 {
            errors.push(ConfigError::new("battery.threshold", "must be >= 0"));
        }
        if self.max_capacity <= self.min_capacity {
            errors.push(ConfigError::new(
                "battery.capacity",
                "must be > battery.threshold",
            ));
        }
        if !(self.battery_effectivity > 0.0 && self.battery_effectivity <= 1.0) {
            errors.push(ConfigError::new(
                "battery.effectivity",
                "must be in (0.0, 1.0]",
            ));
        }

        errors
    }
}

/// Top-level settings parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`Settings::from_toml_file`] or use [`Settings::baseline`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Battery parameters.
    #[serde(default)]
    pub battery: BatterySettings,
    /// Solar surplus handling.
    #[serde(default)]
    pub solar: SolarSettings,
    /// Synthetic input generator used when no input file is given.
    #[serde(default)]
    pub synthetic: SyntheticSettings,
}

/// Battery parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatterySettings {
    /// Maximum charge per hour (kWh).
    pub max_rate: f64,
    /// Usable capacity (kWh).
    pub capacity: f64,
    /// Minimum buffer (kWh).
    pub threshold: f64,
    /// Round-trip efficiency (0.0–1.0].
    pub effectivity: f64,
    /// Battery level at the start of the horizon (kWh).
    pub default_start_level: f64,
}

impl Default for BatterySettings {
    fn default() -> Self {
        Self {
            max_rate: 3.0,
            capacity: 10.0,
            threshold: 1.0,
            effectivity: 0.9,
            default_start_level: 1.0,
        }
    }
}

impl BatterySettings {
    fn planner_config(&self, solar_strategy: SolarStrategy) -> PlannerConfig {
        PlannerConfig {
            max_charge_rate: self.max_rate,
            max_capacity: self.capacity,
            min_capacity: self.threshold,
            battery_effectivity: self.effectivity,
            solar_strategy,
            initial_level: self.default_start_level,
        }
    }
}

/// Solar surplus handling.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarSettings {
    /// `"sell_all"` or `"save_all"`.
    pub strategy: SolarStrategy,
}

/// Parameters of the synthetic input generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticSettings {
    /// Horizon length in hours (must be > 0).
    pub hours: usize,
    /// Random seed.
    pub seed: u64,
    /// Off-peak consumer price per kWh.
    pub base_price: f64,
    /// Consumer price at the daily peaks per kWh.
    pub peak_price: f64,
    /// Spot price as a fraction of the consumer price.
    pub spot_ratio: f64,
    /// Price noise standard deviation.
    pub price_noise_std: f64,
    /// Peak solar production (kWh per hour).
    pub solar_kw_peak: f64,
    /// Sunrise hour of day (inclusive).
    pub sunrise_hour: usize,
    /// Sunset hour of day (exclusive).
    pub sunset_hour: usize,
    /// Mean household consumption (kWh per hour).
    pub consumption_kw: f64,
    /// Daily consumption swing around the mean (kWh per hour).
    pub consumption_amp_kw: f64,
    /// Solar and consumption noise standard deviation.
    pub noise_std: f64,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            hours: 24,
            seed: 42,
            base_price: 1.2,
            peak_price: 3.5,
            spot_ratio: 0.6,
            price_noise_std: 0.05,
            solar_kw_peak: 4.0,
            sunrise_hour: 6,
            sunset_hour: 20,
            consumption_kw: 1.0,
            consumption_amp_kw: 0.5,
            noise_std: 0.05,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Settings {
    /// Returns the baseline settings: 10 kWh battery, 3 kWh/h, 1 kWh buffer.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the sell-all preset: baseline battery, surplus exported when
    /// it is not needed later.
    pub fn sell_all() -> Self {
        Self {
            solar: SolarSettings {
                strategy: SolarStrategy::SellAll,
            },
            synthetic: SyntheticSettings {
                solar_kw_peak: 6.0,
                ..SyntheticSettings::default()
            },
            ..Self::default()
        }
    }

    /// Returns the small-battery preset: tight capacity, slow charging.
    pub fn small_battery() -> Self {
        Self {
            battery: BatterySettings {
                max_rate: 1.5,
                capacity: 5.0,
                threshold: 0.5,
                effectivity: 0.85,
                default_start_level: 0.5,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "sell_all", "small_battery"];

    /// Loads settings from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "sell_all" => Ok(Self::sell_all()),
            "small_battery" => Ok(Self::small_battery()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("settings", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Builds the planner configuration from the battery and solar sections.
    pub fn planner_config(&self) -> PlannerConfig {
        self.battery.planner_config(self.solar.strategy)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.planner_config().validate();

        let syn = &self.synthetic;
        if syn.hours == 0 {
            errors.push(ConfigError::new("synthetic.hours", "must be > 0"));
        }
        if syn.sunrise_hour >= syn.sunset_hour {
            errors.push(ConfigError::new(
                "synthetic.sunrise_hour",
                "must be < synthetic.sunset_hour",
            ));
        }
        if syn.sunset_hour > 24 {
            errors.push(ConfigError::new("synthetic.sunset_hour", "must be <= 24"));
        }
        if syn.peak_price < syn.base_price {
            errors.push(ConfigError::new(
                "synthetic.peak_price",
                "must be >= synthetic.base_price",
            ));
        }

        errors
    }
}
