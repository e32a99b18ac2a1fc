use rayon::prelude::*;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

use crate::analysis::anomaly::classify;
use crate::analysis::moving_average::moving_average;
use crate::analysis::season_stats::compute_season_stats;
use crate::dataset::{AnnotatedObservation, Observation, Season, SeasonalStat};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analysis worker for city '{city}' panicked")]
    WorkerPanic { city: String },
}

/// Output of one pipeline run: the annotated dataset plus the seasonal stats
/// it was classified against. Both are fresh snapshots; a new run over a
/// different observation window recomputes everything from scratch.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub annotated: Vec<AnnotatedObservation>,
    pub stats: Vec<SeasonalStat>,
}

impl AnalysisResult {
    pub fn anomaly_count(&self) -> usize {
        self.annotated.iter().filter(|obs| obs.is_anomaly).count()
    }
}

/// Single-pass reference implementation.
///
/// Sorts by (city, timestamp), computes the per-city moving average, computes
/// the seasonal stats over the whole dataset, then joins and classifies each
/// row. Output is in (city, timestamp) order. This is the correctness oracle
/// for [`run_parallel`].
pub fn run_sequential(observations: &[Observation], window: usize) -> AnalysisResult {
    let ordered = sort_by_city_and_time(observations);
    let stats = compute_season_stats(observations);
    let lookup = stats_lookup(&stats);

    let mut annotated = Vec::with_capacity(ordered.len());
    for city_slice in ordered.chunk_by(|a, b| a.city == b.city) {
        annotated.extend(annotate_city(city_slice, &lookup, window));
    }

    debug!(
        rows = annotated.len(),
        stats = stats.len(),
        "Sequential analysis complete"
    );
    AnalysisResult { annotated, stats }
}

/// City-partitioned variant of [`run_sequential`].
///
/// Seasonal stats are computed once, globally, and shared read-only with every
/// worker; one rayon task per distinct city then runs moving-average + join +
/// classify over that city's slice, and the partition outputs are concatenated.
/// Because every step is city-local, the merged result is bit-identical to the
/// sequential one. For small datasets this is expected to be slower than
/// [`run_sequential`] - the dispatch overhead dominates - which is a
/// documented property, not a defect.
pub fn run_parallel(
    observations: &[Observation],
    window: usize,
) -> Result<AnalysisResult, AnalysisError> {
    let ordered = sort_by_city_and_time(observations);
    let stats = compute_season_stats(observations);
    let lookup = stats_lookup(&stats);

    let partitions: Vec<&[Observation]> = ordered.chunk_by(|a, b| a.city == b.city).collect();
    debug!(partitions = partitions.len(), "Dispatching city partitions");

    // A panicking worker must fail the whole run: silently dropping one city's
    // partition would diverge from the sequential result.
    let partition_results: Vec<Result<Vec<AnnotatedObservation>, AnalysisError>> = partitions
        .par_iter()
        .map(|city_slice| {
            catch_unwind(AssertUnwindSafe(|| annotate_city(city_slice, &lookup, window)))
                .map_err(|_| AnalysisError::WorkerPanic {
                    city: city_slice[0].city.clone(),
                })
        })
        .collect();

    let mut annotated = Vec::with_capacity(ordered.len());
    for partition in partition_results {
        annotated.extend(partition?);
    }

    Ok(AnalysisResult { annotated, stats })
}

/// Compare two pipeline outputs on the columns that matter, after sorting both
/// into canonical (city, timestamp) order.
///
/// Floats must match exactly - both pipelines run the same per-city arithmetic
/// on the same slices, so any difference at all is a real divergence.
pub fn results_match(left: &AnalysisResult, right: &AnalysisResult) -> bool {
    if left.annotated.len() != right.annotated.len() {
        return false;
    }

    let mut a: Vec<&AnnotatedObservation> = left.annotated.iter().collect();
    let mut b: Vec<&AnnotatedObservation> = right.annotated.iter().collect();
    let key = |obs: &&AnnotatedObservation| (obs.city.clone(), obs.timestamp);
    a.sort_by_key(key);
    b.sort_by_key(key);

    a.iter().zip(&b).all(|(x, y)| {
        x.moving_avg == y.moving_avg
            && x.season_mean == y.season_mean
            && x.season_std == y.season_std
            && x.is_anomaly == y.is_anomaly
    })
}

/// Stable sort: observations with equal (city, timestamp) keep input order.
fn sort_by_city_and_time(observations: &[Observation]) -> Vec<Observation> {
    let mut ordered = observations.to_vec();
    ordered.sort_by(|a, b| a.city.cmp(&b.city).then(a.timestamp.cmp(&b.timestamp)));
    ordered
}

fn stats_lookup(stats: &[SeasonalStat]) -> HashMap<(&str, Season), (f64, Option<f64>)> {
    stats
        .iter()
        .map(|stat| {
            (
                (stat.city.as_str(), stat.season),
                (stat.season_mean, stat.season_std),
            )
        })
        .collect()
}

/// Moving-average + join + classify for one city's time-ordered slice.
///
/// This is the unit of parallel work; it touches nothing but its own slice and
/// the read-only stats table.
fn annotate_city(
    city_slice: &[Observation],
    lookup: &HashMap<(&str, Season), (f64, Option<f64>)>,
    window: usize,
) -> Vec<AnnotatedObservation> {
    let temperatures: Vec<f64> = city_slice.iter().map(|obs| obs.temperature).collect();
    let averages = moving_average(&temperatures, window);

    city_slice
        .iter()
        .zip(averages)
        .map(|(obs, moving_avg)| {
            let baseline = lookup.get(&(obs.city.as_str(), obs.season));
            let season_mean = baseline.map(|(mean, _)| *mean);
            let season_std = baseline.and_then(|(_, std)| *std);
            let classification = classify(obs.temperature, season_mean, season_std);
            AnnotatedObservation {
                city: obs.city.clone(),
                timestamp: obs.timestamp,
                temperature: obs.temperature,
                season: obs.season,
                moving_avg,
                season_mean,
                season_std,
                is_anomaly: classification.is_anomaly,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn obs(city: &str, day: u32, temperature: f64) -> Observation {
        Observation {
            city: city.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            temperature,
            season: Season::Winter,
        }
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let observations = vec![obs("X", 1, 1.0), obs("X", 1, 2.0), obs("X", 1, 3.0)];
        let ordered = sort_by_city_and_time(&observations);
        let temperatures: Vec<f64> = ordered.iter().map(|o| o.temperature).collect();
        assert_eq!(temperatures, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sequential_orders_by_city_then_time() {
        let observations = vec![
            obs("Moscow", 2, 1.0),
            obs("Berlin", 5, 2.0),
            obs("Moscow", 1, 3.0),
            obs("Berlin", 3, 4.0),
        ];
        let result = run_sequential(&observations, 3);
        let order: Vec<(String, u32)> = result
            .annotated
            .iter()
            .map(|o| (o.city.clone(), chrono::Datelike::day(&o.timestamp)))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Berlin".to_string(), 3),
                ("Berlin".to_string(), 5),
                ("Moscow".to_string(), 1),
                ("Moscow".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_single_sample_group_classifies_as_undetermined() {
        let observations = vec![obs("X", 1, 42.0)];
        let result = run_sequential(&observations, 7);
        assert_eq!(result.annotated.len(), 1);
        let row = &result.annotated[0];
        assert!(!row.is_anomaly);
        assert!(row.season_std.is_none());
        assert_eq!(row.moving_avg, 42.0);
    }

    #[test]
    fn test_worker_panic_surfaces_as_error() {
        // window 0 trips the moving-average assertion inside the worker; the
        // pipeline must report the failed city instead of dropping it.
        let observations = vec![obs("X", 1, 1.0)];
        let result = run_parallel(&observations, 0);
        match result {
            Err(AnalysisError::WorkerPanic { city }) => assert_eq!(city, "X"),
            other => panic!("Expected WorkerPanic, got {other:?}"),
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut observations = Vec::new();
        for day in 1..=20 {
            observations.push(obs("Berlin", day, day as f64 * 0.7 - 3.0));
            observations.push(obs("Moscow", day, -(day as f64) * 1.3));
            observations.push(obs("Cairo", day, 14.0 + (day % 5) as f64));
        }
        // An outlier so the anomaly column is exercised.
        observations.push(obs("Berlin", 21, 99.0));

        let sequential = run_sequential(&observations, 7);
        let parallel = run_parallel(&observations, 7).unwrap();
        assert!(results_match(&sequential, &parallel));
        assert!(sequential.anomaly_count() > 0);
    }
}
