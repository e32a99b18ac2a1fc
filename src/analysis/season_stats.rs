use std::collections::BTreeMap;

use crate::dataset::{Observation, Season, SeasonalStat};

/// Compute per-(city, season) temperature baselines.
///
/// The mean is arithmetic; the standard deviation is the sample deviation
/// (n-1 denominator). A group with a single observation yields `season_std:
/// None` - there is no defined spread, and classification against such a group
/// must report "undetermined" rather than using a bound. Output is sorted by
/// (city, season) so the persisted artifact is stable from run to run.
pub fn compute_season_stats(observations: &[Observation]) -> Vec<SeasonalStat> {
    let mut groups: BTreeMap<(String, Season), Vec<f64>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.city.clone(), obs.season))
            .or_default()
            .push(obs.temperature);
    }

    groups
        .into_iter()
        .map(|((city, season), temperatures)| {
            let n = temperatures.len() as f64;
            let mean = temperatures.iter().sum::<f64>() / n;
            let std = sample_std(&temperatures, mean);
            SeasonalStat {
                city,
                season,
                season_mean: mean,
                season_std: std,
            }
        })
        .collect()
}

fn sample_std(temperatures: &[f64], mean: f64) -> Option<f64> {
    if temperatures.len() < 2 {
        return None;
    }
    let sum_sq: f64 = temperatures
        .iter()
        .map(|t| {
            let diff = t - mean;
            diff * diff
        })
        .sum();
    Some((sum_sq / (temperatures.len() as f64 - 1.0)).sqrt())
}
