//! Persisted seasonal-stats artifact.
//!
//! `analyze-history` writes the stats table once per offline run;
//! `monitor-cities` reads it back to classify live readings. Plain CSV with
//! columns {city, season, season_mean, season_std}; an empty `season_std` cell
//! round-trips as `None`. There is no schema versioning - consumers must
//! tolerate absent (city, season) rows and report "cannot classify".

use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use tracing::debug;

use crate::dataset::{Season, SeasonalStat};

#[derive(Debug, thiserror::Error)]
pub enum StatsStoreError {
    #[error("Failed to access stats file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse stats CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{0}' in stats file")]
    MissingColumn(&'static str),
    #[error("Row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

pub fn save_stats(path: &Path, stats: &[SeasonalStat]) -> Result<(), StatsStoreError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["city", "season", "season_mean", "season_std"])?;

    for stat in stats {
        writer.write_record([
            stat.city.clone(),
            stat.season.to_string(),
            stat.season_mean.to_string(),
            stat.season_std.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    debug!("Wrote {} stat rows to {}", stats.len(), path.display());
    Ok(())
}

pub fn load_stats(path: &Path) -> Result<Vec<SeasonalStat>, StatsStoreError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(StatsStoreError::MissingColumn(name))
    };
    let city_idx = find("city")?;
    let season_idx = find("season")?;
    let mean_idx = find("season_mean")?;
    let std_idx = find("season_std")?;

    let mut stats = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 2;

        let invalid = |column: &'static str, value: &str| StatsStoreError::InvalidValue {
            row,
            column,
            value: value.to_string(),
        };

        let city = record.get(city_idx).unwrap_or("").trim();
        if city.is_empty() {
            return Err(invalid("city", city));
        }

        let season_value = record.get(season_idx).unwrap_or("").trim();
        let season: Season = season_value
            .parse()
            .map_err(|_| invalid("season", season_value))?;

        let mean_value = record.get(mean_idx).unwrap_or("").trim();
        let season_mean: f64 = mean_value
            .parse()
            .map_err(|_| invalid("season_mean", mean_value))?;

        // An empty std cell is a single-sample group with no defined spread.
        let std_value = record.get(std_idx).unwrap_or("").trim();
        let season_std = if std_value.is_empty() {
            None
        } else {
            Some(
                std_value
                    .parse::<f64>()
                    .map_err(|_| invalid("season_std", std_value))?,
            )
        };

        stats.push(SeasonalStat {
            city: city.to_string(),
            season,
            season_mean,
            season_std,
        });
    }

    debug!("Loaded {} stat rows from {}", stats.len(), path.display());
    Ok(stats)
}
