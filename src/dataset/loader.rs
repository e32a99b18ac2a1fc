use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::dataset::error::DatasetError;
use crate::dataset::models::{AnnotatedObservation, Observation, Season};

/// Header columns every input dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["city", "timestamp", "temperature", "season"];

/// Load historical observations from a CSV file.
///
/// The file must have a header row containing all of [`REQUIRED_COLUMNS`];
/// extra columns are ignored. Any missing column or unparseable cell is a hard
/// error naming the offending column (and row) - rows are never silently
/// dropped.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>, DatasetError> {
    debug!("Loading observations from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_observations(file)
}

/// Parse observations from any CSV reader. See [`load_observations`].
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>, DatasetError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut observations = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Row 1 is the header, so data rows start at 2.
        let row = index + 2;
        observations.push(parse_row(&record, &columns, row)?);
    }

    debug!("Parsed {} observations", observations.len());
    Ok(observations)
}

/// Keep only observations with `start <= timestamp <= end`.
///
/// Either bound may be `None` to leave that side open.
pub fn filter_by_date_range(
    observations: &[Observation],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Observation> {
    observations
        .iter()
        .filter(|obs| start.map_or(true, |s| obs.timestamp >= s))
        .filter(|obs| end.map_or(true, |e| obs.timestamp <= e))
        .cloned()
        .collect()
}

/// Sorted, de-duplicated list of cities present in the dataset.
pub fn distinct_cities(observations: &[Observation]) -> Vec<String> {
    let mut cities: Vec<String> = observations.iter().map(|obs| obs.city.clone()).collect();
    cities.sort();
    cities.dedup();
    cities
}

/// Write the annotated dataset as CSV.
///
/// `season_mean`/`season_std` are left empty when the baseline had no coverage.
pub fn save_annotated(
    path: &Path,
    annotated: &[AnnotatedObservation],
) -> Result<(), DatasetError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record([
        "city",
        "timestamp",
        "temperature",
        "season",
        "moving_avg",
        "season_mean",
        "season_std",
        "is_anomaly",
    ])?;

    for obs in annotated {
        writer.write_record([
            obs.city.clone(),
            obs.timestamp.to_rfc3339(),
            obs.temperature.to_string(),
            obs.season.to_string(),
            obs.moving_avg.to_string(),
            obs.season_mean.map(|v| v.to_string()).unwrap_or_default(),
            obs.season_std.map(|v| v.to_string()).unwrap_or_default(),
            obs.is_anomaly.to_string(),
        ])?;
    }

    writer.flush()?;
    debug!("Wrote {} annotated rows to {}", annotated.len(), path.display());
    Ok(())
}

struct ColumnIndexes {
    city: usize,
    timestamp: usize,
    temperature: usize,
    season: usize,
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnIndexes, DatasetError> {
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(DatasetError::MissingColumn(name))
    };

    Ok(ColumnIndexes {
        city: find("city")?,
        timestamp: find("timestamp")?,
        temperature: find("temperature")?,
        season: find("season")?,
    })
}

fn parse_row(
    record: &StringRecord,
    columns: &ColumnIndexes,
    row: usize,
) -> Result<Observation, DatasetError> {
    let cell = |index: usize, column: &'static str| {
        record
            .get(index)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(DatasetError::MissingValue { row, column })
    };

    let city = cell(columns.city, "city")?.to_string();

    let timestamp_value = cell(columns.timestamp, "timestamp")?;
    let timestamp =
        parse_timestamp(timestamp_value).map_err(|reason| DatasetError::InvalidValue {
            row,
            column: "timestamp",
            value: timestamp_value.to_string(),
            reason,
        })?;

    let temperature_value = cell(columns.temperature, "temperature")?;
    let temperature: f64 =
        temperature_value
            .parse()
            .map_err(|_| DatasetError::InvalidValue {
                row,
                column: "temperature",
                value: temperature_value.to_string(),
                reason: "expected a number".to_string(),
            })?;
    if !temperature.is_finite() {
        return Err(DatasetError::InvalidValue {
            row,
            column: "temperature",
            value: temperature_value.to_string(),
            reason: "expected a finite number".to_string(),
        });
    }

    let season_value = cell(columns.season, "season")?;
    let season: Season = season_value.parse().map_err(|reason: &'static str| {
        DatasetError::InvalidValue {
            row,
            column: "season",
            value: season_value.to_string(),
            reason: reason.to_string(),
        }
    })?;

    Ok(Observation {
        city,
        timestamp,
        temperature,
        season,
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, or a bare `YYYY-MM-DD` date.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0).unwrap();
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    Err("expected an ISO-8601 date or date-time".to_string())
}
