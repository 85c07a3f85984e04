//! Scenario runner: forecast, size the supply, allocate.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::allocation::{
    AllocationEngine, AllocationError, AllocationRequest, AllocationResult, Resolution,
};
use crate::config::{ConfigError, ForecastConfig, ForecastSource, ScenarioConfig};
use crate::forecast::{
    DemandForecaster, ForecastError, ForecastTable, SyntheticForecast, WeekdayProfile,
};
use crate::generation::{SupplyBreakdown, SupplyError};

/// Anything that can stop a scenario run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid scenario ({} problem(s)): {}", .0.len(), join_errors(.0))]
    Config(Vec<ConfigError>),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error(transparent)]
    Supply(#[from] SupplyError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything produced by one scenario run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub date: NaiveDate,
    /// Name of the forecast source used.
    pub forecaster: &'static str,
    pub supply: SupplyBreakdown,
    pub result: AllocationResult,
}

impl RunOutcome {
    /// Per-entity listing, one line per entity in forecast order.
    pub fn entries_table(&self) -> EntriesTable<'_> {
        EntriesTable(&self.result)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Date: {} ({} forecast, {} entities)",
            self.date,
            self.forecaster,
            self.result.entries().len()
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.supply)?;
        writeln!(f)?;
        write!(f, "{}", self.result.summary())
    }
}

/// Display adapter listing every allocation entry.
pub struct EntriesTable<'a>(&'a AllocationResult);

impl fmt::Display for EntriesTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:>12} {:>12} {:>12} {:>7}",
            "entity", "demand", "allocated", "unmet", "served"
        )?;
        for e in self.0.entries() {
            writeln!(
                f,
                "{:<12} {:>12.3} {:>12.3} {:>12.3} {:>6.1}%",
                e.entity_id.as_str(),
                e.predicted_demand,
                e.allocated,
                e.unmet,
                100.0 * e.satisfaction()
            )?;
        }
        Ok(())
    }
}

/// Builds the forecaster a scenario asks for.
///
/// # Errors
///
/// Returns a [`RunError`] if a file-backed source has no path or its file
/// cannot be loaded.
pub fn build_forecaster(cfg: &ForecastConfig) -> Result<Box<dyn DemandForecaster>, RunError> {
    let require_path = || {
        cfg.path.as_deref().ok_or_else(|| {
            RunError::Config(vec![ConfigError {
                field: "forecast.path".into(),
                message: "required for \"table\" and \"history\" sources".into(),
            }])
        })
    };

    Ok(match cfg.source {
        ForecastSource::Synthetic => Box::new(SyntheticForecast::new(
            cfg.households,
            cfg.base_kwh,
            cfg.seasonal_amp_kwh,
            cfg.noise_std_kwh,
            cfg.seed,
        )),
        ForecastSource::Table => {
            let path = require_path()?;
            info!(path = %path.display(), "loading forecast table");
            Box::new(ForecastTable::from_path(path)?)
        }
        ForecastSource::History => {
            let path = require_path()?;
            info!(path = %path.display(), "loading consumption history");
            Box::new(WeekdayProfile::from_path(path)?)
        }
    })
}

/// Runs a complete scenario: validate, forecast, size the supply, allocate.
///
/// # Errors
///
/// Returns a [`RunError`] for an invalid scenario, a failing forecast source,
/// bad generator parameters, or a rejected allocation request.
pub fn run_scenario(config: &ScenarioConfig) -> Result<RunOutcome, RunError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(RunError::Config(errors));
    }

    let date = config.run.date;
    let forecaster = build_forecaster(&config.forecast)?;
    let demands = forecaster.forecast(date)?;
    info!(
        %date,
        source = forecaster.name(),
        entities = demands.len(),
        "demand forecast ready"
    );

    let supply = config.supply.breakdown()?;
    debug!(
        fixed_kwh = supply.fixed_kwh,
        solar_kwh = supply.solar_kwh,
        wind_kwh = supply.wind_kwh,
        "supply estimated"
    );

    let engine = AllocationEngine::new(Resolution::new(config.run.resolution_decimals));
    let result = engine.allocate(&AllocationRequest::new(supply.total_kwh(), demands))?;
    info!(
        verdict = ?result.verdict(),
        total_demand = result.total_demand(),
        total_allocated = result.total_allocated(),
        "allocation complete"
    );

    Ok(RunOutcome {
        date,
        forecaster: forecaster.name(),
        supply,
        result,
    })
}
