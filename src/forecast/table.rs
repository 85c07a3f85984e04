use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{DemandForecaster, ForecastError, parse_day};
use crate::allocation::{DemandEntry, EntityId};

/// One row of a forecast file.
#[derive(Debug, Deserialize)]
struct ForecastRecord {
    #[serde(alias = "LCLid")]
    entity_id: String,
    #[serde(alias = "day")]
    date: String,
    #[serde(alias = "predicted_energy")]
    predicted_demand: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct ForecastRow {
    date: NaiveDate,
    entry: DemandEntry,
}

/// Forecasts produced ahead of time by an external model.
///
/// Reads a CSV with `entity_id,date,predicted_demand` columns (the
/// `LCLid`, `day` and `predicted_energy` header names are also accepted).
/// Demand values are handed through untouched; range checks belong to the
/// allocation engine.
#[derive(Debug, Clone, Default)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// Loads a forecast table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns a [`ForecastError`] if the file cannot be opened, a record is
    /// malformed, or a date does not parse.
    pub fn from_path(path: &Path) -> Result<Self, ForecastError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| ForecastError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_csv(reader)
    }

    /// Loads a forecast table from any CSV source.
    ///
    /// # Errors
    ///
    /// See [`ForecastTable::from_path`].
    pub fn from_reader(reader: impl Read) -> Result<Self, ForecastError> {
        Self::from_csv(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, ForecastError> {
        let mut rows = Vec::new();
        for (idx, record) in reader.deserialize::<ForecastRecord>().enumerate() {
            let record = record?;
            let date = parse_day(&record.date).ok_or_else(|| ForecastError::BadDate {
                line: idx + 2,
                value: record.date.clone(),
            })?;
            rows.push(ForecastRow {
                date,
                entry: DemandEntry::new(EntityId::from(record.entity_id), record.predicted_demand),
            });
        }
        Ok(Self { rows })
    }

    /// Number of rows across all dates.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct dates covered by the table, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }
}

impl DemandForecaster for ForecastTable {
    fn forecast(&self, date: NaiveDate) -> Result<Vec<DemandEntry>, ForecastError> {
        let entries: Vec<DemandEntry> = self
            .rows
            .iter()
            .filter(|r| r.date == date)
            .map(|r| r.entry.clone())
            .collect();
        if entries.is_empty() {
            return Err(ForecastError::NoData(date));
        }
        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
entity_id,date,predicted_demand
MAC000002,2013-06-15,8.5
MAC000003,2013-06-15,12.25
MAC000002,2013-06-16,9.0
MAC000004,2013-06-15,0
";

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn returns_rows_for_date_in_file_order() {
        let table = ForecastTable::from_reader(TABLE.as_bytes()).expect("table parses");
        let entries = table.forecast(day(2013, 6, 15)).expect("date present");
        let ids: Vec<&str> = entries.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, ["MAC000002", "MAC000003", "MAC000004"]);
        assert_eq!(entries[1].predicted_demand, 12.25);
    }

    #[test]
    fn missing_date_is_an_error() {
        let table = ForecastTable::from_reader(TABLE.as_bytes()).expect("table parses");
        let err = table.forecast(day(2014, 1, 1)).err();
        assert!(matches!(err, Some(ForecastError::NoData(_))));
    }

    #[test]
    fn lists_distinct_dates() {
        let table = ForecastTable::from_reader(TABLE.as_bytes()).expect("table parses");
        assert_eq!(table.len(), 4);
        assert_eq!(table.dates(), vec![day(2013, 6, 15), day(2013, 6, 16)]);
    }

    #[test]
    fn accepts_source_column_names() {
        let csv = "LCLid,day,predicted_energy\nMAC000010,15-06-2013,4.0\n";
        let table = ForecastTable::from_reader(csv.as_bytes()).expect("table parses");
        let entries = table.forecast(day(2013, 6, 15)).expect("date present");
        assert_eq!(entries, vec![DemandEntry::new("MAC000010", 4.0)]);
    }

    #[test]
    fn negative_values_pass_through_unchanged() {
        let csv = "entity_id,date,predicted_demand\nA,2013-06-15,-5\n";
        let table = ForecastTable::from_reader(csv.as_bytes()).expect("table parses");
        let entries = table.forecast(day(2013, 6, 15)).expect("date present");
        assert_eq!(entries[0].predicted_demand, -5.0);
    }

    #[test]
    fn bad_date_reports_line() {
        let csv = "entity_id,date,predicted_demand\nA,2013-06-15,1\nB,June 15,2\n";
        let err = ForecastTable::from_reader(csv.as_bytes()).err();
        assert!(matches!(err, Some(ForecastError::BadDate { line: 3, .. })));
    }

    #[test]
    fn non_numeric_demand_is_a_csv_error() {
        let csv = "entity_id,date,predicted_demand\nA,2013-06-15,lots\n";
        let err = ForecastTable::from_reader(csv.as_bytes()).err();
        assert!(matches!(err, Some(ForecastError::Csv(_))));
    }
}
