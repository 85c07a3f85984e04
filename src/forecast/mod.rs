//! Demand forecast sources feeding the allocation engine.
//!
//! The allocator only relies on the output contract: for a date, an ordered
//! list of `(entity_id, predicted_demand)` pairs. Order is the order in which
//! entities first appear in the source.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::allocation::DemandEntry;

/// Weekday-and-month mean over a consumption history.
pub mod history;
/// Seeded synthetic household demand.
pub mod synthetic;
/// Precomputed forecasts read from CSV.
pub mod table;

pub use history::WeekdayProfile;
pub use synthetic::SyntheticForecast;
pub use table::ForecastTable;

/// A source of per-entity demand forecasts.
pub trait DemandForecaster {
    /// Returns the forecasted demand of every known entity for `date`.
    ///
    /// # Errors
    ///
    /// Returns a [`ForecastError`] if the source has nothing for `date`.
    fn forecast(&self, date: NaiveDate) -> Result<Vec<DemandEntry>, ForecastError>;

    /// Short human-readable name of the source.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("cannot open \"{}\": {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed record: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: cannot parse date \"{value}\" (expected YYYY-MM-DD or DD-MM-YYYY)")]
    BadDate { line: usize, value: String },

    #[error("no demand forecast available for {0}")]
    NoData(NaiveDate),
}

/// Parses an ISO (`2013-06-15`) or day-first (`15-06-2013`) date.
pub(crate) fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d-%m-%Y"))
        .ok()
}
