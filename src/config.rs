//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::allocation::quantity::MAX_DECIMALS;
use crate::generation::{Orientation, SolarArray, SupplyPlan, WindTurbine};

/// Top-level scenario configuration parsed from TOML.
///
/// Missing sections fall back to defaults (synthetic demand, no supply).
/// Load from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Target date and numeric settings.
    #[serde(default)]
    pub run: RunConfig,
    /// Where per-entity demand comes from.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Energy available to distribute.
    #[serde(default)]
    pub supply: SupplyPlan,
}

/// Target date and numeric settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Date the demand forecast is made for.
    pub date: NaiveDate,
    /// Decimal places the allocation is computed at.
    pub resolution_decimals: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(2013, 6, 15).unwrap_or(NaiveDate::MIN),
            resolution_decimals: 3,
        }
    }
}

/// Demand forecast source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    /// Seeded synthetic households.
    Synthetic,
    /// Precomputed forecast CSV.
    Table,
    /// Weekday profile over a consumption history CSV.
    History,
}

/// Demand forecast parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    pub source: ForecastSource,
    /// CSV file for the `table` and `history` sources. Relative paths are
    /// resolved against the scenario file's directory.
    pub path: Option<PathBuf>,
    /// Number of synthetic households.
    pub households: usize,
    /// Master random seed for synthetic demand.
    pub seed: u64,
    /// Mean daily household demand (kWh).
    pub base_kwh: f64,
    /// Seasonal swing around the mean (kWh).
    pub seasonal_amp_kwh: f64,
    /// Day-to-day noise standard deviation (kWh).
    pub noise_std_kwh: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            source: ForecastSource::Synthetic,
            path: None,
            households: 50,
            seed: 42,
            base_kwh: 10.0,
            seasonal_amp_kwh: 3.0,
            noise_std_kwh: 0.8,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.households"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a synthetic neighbourhood with supply
    /// comfortably above demand.
    pub fn baseline() -> Self {
        Self {
            run: RunConfig::default(),
            forecast: ForecastConfig::default(),
            supply: SupplyPlan {
                fixed_kwh: 400.0,
                solar: vec![
                    SolarArray::new(40.0, Orientation::South),
                    SolarArray::new(40.0, Orientation::East),
                ],
                wind: vec![WindTurbine::new(10.0, 6.0)],
            },
        }
    }

    /// Returns the scarcity preset: same neighbourhood, supply well short of
    /// demand so the fair-share split kicks in.
    pub fn scarcity() -> Self {
        Self {
            supply: SupplyPlan {
                fixed_kwh: 150.0,
                solar: vec![SolarArray::new(40.0, Orientation::South)],
                wind: Vec::new(),
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "scarcity"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "scarcity" => Ok(Self::scarcity()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// A relative `forecast.path` is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let (Some(data), Some(dir)) = (cfg.forecast.path.as_mut(), path.parent()) {
            if data.is_relative() {
                *data = dir.join(&*data);
            }
        }
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.run.resolution_decimals > MAX_DECIMALS {
            errors.push(ConfigError {
                field: "run.resolution_decimals".into(),
                message: format!("must be <= {MAX_DECIMALS}"),
            });
        }

        let f = &self.forecast;
        match f.source {
            ForecastSource::Synthetic => {
                if f.households == 0 {
                    errors.push(ConfigError {
                        field: "forecast.households".into(),
                        message: "must be > 0".into(),
                    });
                }
                if !(f.base_kwh.is_finite() && f.base_kwh >= 0.0) {
                    errors.push(ConfigError {
                        field: "forecast.base_kwh".into(),
                        message: "must be a finite value >= 0".into(),
                    });
                }
                if !f.seasonal_amp_kwh.is_finite() {
                    errors.push(ConfigError {
                        field: "forecast.seasonal_amp_kwh".into(),
                        message: "must be finite".into(),
                    });
                }
                if !(f.noise_std_kwh.is_finite() && f.noise_std_kwh >= 0.0) {
                    errors.push(ConfigError {
                        field: "forecast.noise_std_kwh".into(),
                        message: "must be a finite value >= 0".into(),
                    });
                }
            }
            ForecastSource::Table | ForecastSource::History => {
                if f.path.is_none() {
                    errors.push(ConfigError {
                        field: "forecast.path".into(),
                        message: "required for \"table\" and \"history\" sources".into(),
                    });
                }
            }
        }

        if let Err(e) = self.supply.validate() {
            errors.push(ConfigError {
                field: format!("supply.{}", e.field),
                message: e.message,
            });
        }

        errors
    }
}
