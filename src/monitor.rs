use chrono::{DateTime, Datelike, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use crate::analysis::{classify, Classification};
use crate::dataset::{LiveReading, Season, SeasonalStat};
use crate::fetch_error::FetchError;
use crate::fetcher::WeatherFetcher;

/// Outcome of one city's live temperature check.
#[derive(Debug)]
pub struct CityCheck {
    pub reading: LiveReading,
    /// Why the reading is missing; `None` when the fetch succeeded. Kept as
    /// the tagged [`FetchError`] so callers can tell a rejected credential
    /// from a transient failure.
    pub error: Option<FetchError>,
    pub is_anomaly: bool,
    pub season_mean: Option<f64>,
    pub season_std: Option<f64>,
}

/// Baseline row for (city, season), if the stats table covers it.
pub fn find_baseline<'a>(
    stats: &'a [SeasonalStat],
    city: &str,
    season: Season,
) -> Option<&'a SeasonalStat> {
    stats
        .iter()
        .find(|stat| stat.city == city && stat.season == season)
}

/// Classify a live temperature against the baseline for the season at `at`.
///
/// The season is derived from the month of `at`; a city or season missing
/// from the stats table yields an undetermined classification.
pub fn classify_reading(
    city: &str,
    temperature: f64,
    stats: &[SeasonalStat],
    at: DateTime<Utc>,
) -> Classification {
    let season = Season::from_month(at.month());
    let baseline = find_baseline(stats, city, season);
    classify(
        temperature,
        baseline.map(|stat| stat.season_mean),
        baseline.and_then(|stat| stat.season_std),
    )
}

/// Fetch and classify current temperatures for all cities concurrently.
///
/// Every request is launched up front and the results are collected once all
/// complete; a failed or timed-out city produces a null reading carrying its
/// tagged error and never aborts the siblings.
#[instrument(skip(fetcher, stats), fields(cities = cities.len()))]
pub async fn check_cities(
    fetcher: &WeatherFetcher,
    cities: &[String],
    stats: &[SeasonalStat],
    at: DateTime<Utc>,
) -> HashMap<String, CityCheck> {
    let fetches = cities.iter().map(|city| async move {
        let result = fetcher.fetch_current_temperature(city).await;
        (city.clone(), result)
    });
    let results = join_all(fetches).await;
    debug!("All live fetches settled");

    results
        .into_iter()
        .map(|(city, result)| {
            let check = build_check(&city, result, stats, at);
            (city, check)
        })
        .collect()
}

/// One-request-at-a-time variant of [`check_cities`], for the synchronous
/// lookup path. Same per-city isolation; only the dispatch differs.
pub async fn check_cities_sequential(
    fetcher: &WeatherFetcher,
    cities: &[String],
    stats: &[SeasonalStat],
    at: DateTime<Utc>,
) -> HashMap<String, CityCheck> {
    let mut checks = HashMap::with_capacity(cities.len());
    for city in cities {
        let result = fetcher.fetch_current_temperature(city).await;
        checks.insert(city.clone(), build_check(city, result, stats, at));
    }
    checks
}

fn build_check(
    city: &str,
    result: Result<f64, FetchError>,
    stats: &[SeasonalStat],
    at: DateTime<Utc>,
) -> CityCheck {
    match result {
        Ok(temperature) => {
            let classification = classify_reading(city, temperature, stats, at);
            CityCheck {
                reading: LiveReading {
                    city: city.to_string(),
                    temperature: Some(temperature),
                },
                error: None,
                is_anomaly: classification.is_anomaly,
                season_mean: classification.season_mean,
                season_std: classification.season_std,
            }
        }
        Err(error) => {
            warn!("Failed to fetch current temperature for {}: {}", city, error);
            CityCheck {
                reading: LiveReading {
                    city: city.to_string(),
                    temperature: None,
                },
                error: Some(error),
                is_anomaly: false,
                season_mean: None,
                season_std: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn winter_stats() -> Vec<SeasonalStat> {
        vec![SeasonalStat {
            city: "X".to_string(),
            season: Season::Winter,
            season_mean: 0.0,
            season_std: Some(10.0_f64.sqrt()),
        }]
    }

    #[test]
    fn test_classify_reading_uses_current_season() {
        let stats = winter_stats();
        let january = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let july = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();

        // 10 > 0 + 2*sqrt(10) (~6.32): anomalous against the winter baseline.
        assert!(classify_reading("X", 10.0, &stats, january).is_anomaly);
        assert!(!classify_reading("X", 5.0, &stats, january).is_anomaly);

        // No summer row: undetermined.
        let summer = classify_reading("X", 10.0, &stats, july);
        assert!(!summer.is_anomaly);
        assert!(summer.season_mean.is_none());
    }

    #[test]
    fn test_classify_reading_unknown_city() {
        let stats = winter_stats();
        let january = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let result = classify_reading("Atlantis", 10.0, &stats, january);
        assert!(!result.is_anomaly);
        assert!(result.season_mean.is_none());
        assert!(result.season_std.is_none());
    }

    #[test]
    fn test_find_baseline_missing_row() {
        let stats = winter_stats();
        assert!(find_baseline(&stats, "X", Season::Winter).is_some());
        assert!(find_baseline(&stats, "X", Season::Summer).is_none());
        assert!(find_baseline(&stats, "Y", Season::Winter).is_none());
    }
}
