//! Command-line interface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::config::{ConfigError, ScenarioConfig};
use crate::generation::SupplyPlan;

/// Forecast per-entity energy demand and share a finite supply fairly.
///
/// If neither --scenario nor --preset is given, the baseline preset is used.
#[derive(Debug, Parser)]
#[command(name = "energy-allocator", version)]
pub struct Cli {
    /// Load the scenario from a TOML file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, scarcity).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override the forecast date (YYYY-MM-DD).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Replace the scenario's supply with a fixed quantity (kWh).
    #[arg(long, value_name = "KWH", allow_negative_numbers = true)]
    pub supply: Option<f64>,

    /// Override the synthetic forecast seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print one line per entity after the report.
    #[arg(long)]
    pub entries: bool,

    /// Logging filter in tracing EnvFilter syntax, e.g. "info" or
    /// "energy_allocator=debug". RUST_LOG takes precedence when set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Resolves the scenario source and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the scenario file cannot be loaded or the
    /// preset is unknown.
    pub fn load_scenario(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut scenario = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
            (None, Some(name)) => ScenarioConfig::from_preset(name)?,
            (None, None) => ScenarioConfig::baseline(),
        };

        if let Some(date) = self.date {
            scenario.run.date = date;
        }
        if let Some(kwh) = self.supply {
            scenario.supply = SupplyPlan::fixed(kwh);
        }
        if let Some(seed) = self.seed {
            scenario.forecast.seed = seed;
        }
        Ok(scenario)
    }
}
