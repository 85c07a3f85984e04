use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use tracing::debug;

use super::{DemandForecaster, ForecastError, parse_day};
use crate::allocation::{DemandEntry, EntityId};

/// One row of a daily consumption history.
#[derive(Debug, Deserialize)]
struct HistoryRecord {
    #[serde(alias = "LCLid")]
    entity_id: String,
    day: String,
    #[serde(alias = "energy_median")]
    energy: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    weekday: Weekday,
    month: u32,
    energy: f64,
}

/// Calendar baseline over a daily consumption history.
///
/// For each entity the prediction is the mean of its history on the same
/// weekday in the same month. Entities with no such day fall back to the
/// same weekday in any month, then to their overall mean.
///
/// Rows with an empty, negative, or non-finite energy value are dropped on
/// load, so every prediction is a valid non-negative demand.
#[derive(Debug, Clone, Default)]
pub struct WeekdayProfile {
    order: Vec<EntityId>,
    history: HashMap<EntityId, Vec<Observation>>,
    dropped: usize,
}

impl WeekdayProfile {
    /// Loads a history from a CSV file with `entity_id,day,energy` columns
    /// (`LCLid` and `energy_median` are accepted as header names).
    ///
    /// # Errors
    ///
    /// Returns a [`ForecastError`] if the file cannot be opened, a record is
    /// malformed, or a day does not parse.
    pub fn from_path(path: &Path) -> Result<Self, ForecastError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|source| ForecastError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_csv(reader)
    }

    /// Loads a history from any CSV source.
    ///
    /// # Errors
    ///
    /// See [`WeekdayProfile::from_path`].
    pub fn from_reader(reader: impl Read) -> Result<Self, ForecastError> {
        Self::from_csv(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .flexible(true)
                .from_reader(reader),
        )
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, ForecastError> {
        let mut profile = Self::default();
        for (idx, record) in reader.deserialize::<HistoryRecord>().enumerate() {
            let record = record?;
            let day = parse_day(&record.day).ok_or_else(|| ForecastError::BadDate {
                line: idx + 2,
                value: record.day.clone(),
            })?;
            match record.energy {
                Some(energy) if energy.is_finite() && energy >= 0.0 => {
                    profile.record(EntityId::from(record.entity_id), day, energy);
                }
                _ => profile.dropped += 1,
            }
        }
        debug!(
            entities = profile.order.len(),
            dropped = profile.dropped,
            "loaded consumption history"
        );
        Ok(profile)
    }

    /// Adds one day of consumption for an entity.
    pub fn record(&mut self, entity_id: EntityId, day: NaiveDate, energy: f64) {
        let observation = Observation {
            weekday: day.weekday(),
            month: day.month(),
            energy,
        };
        match self.history.get_mut(&entity_id) {
            Some(obs) => obs.push(observation),
            None => {
                self.order.push(entity_id.clone());
                self.history.insert(entity_id, vec![observation]);
            }
        }
    }

    /// Number of entities with at least one usable observation.
    pub fn entity_count(&self) -> usize {
        self.order.len()
    }

    /// Rows skipped on load because their energy value was unusable.
    pub fn dropped_rows(&self) -> usize {
        self.dropped
    }

    fn predict(observations: &[Observation], date: NaiveDate) -> f64 {
        let weekday = date.weekday();
        let month = date.month();
        mean(
            observations
                .iter()
                .filter(|o| o.weekday == weekday && o.month == month),
        )
        .or_else(|| mean(observations.iter().filter(|o| o.weekday == weekday)))
        .or_else(|| mean(observations.iter()))
        .unwrap_or(0.0)
    }
}

fn mean<'a>(observations: impl Iterator<Item = &'a Observation>) -> Option<f64> {
    let (sum, n) = observations.fold((0.0, 0_usize), |(s, n), o| (s + o.energy, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl DemandForecaster for WeekdayProfile {
    fn forecast(&self, date: NaiveDate) -> Result<Vec<DemandEntry>, ForecastError> {
        if self.order.is_empty() {
            return Err(ForecastError::NoData(date));
        }
        Ok(self
            .order
            .iter()
            .map(|id| {
                let observations = self.history.get(id).map(Vec::as_slice).unwrap_or(&[]);
                DemandEntry::new(id.clone(), Self::predict(observations, date))
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "history"
    }
}
