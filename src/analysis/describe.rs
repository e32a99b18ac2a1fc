use serde::Serialize;

use crate::dataset::Observation;

/// Descriptive temperature statistics for one city.
#[derive(Debug, Clone, Serialize)]
pub struct CitySummary {
    pub city: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` for a single observation.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Summarize a city's temperature distribution, or `None` if the city has no
/// observations.
pub fn describe_city(observations: &[Observation], city: &str) -> Option<CitySummary> {
    let temperatures: Vec<f64> = observations
        .iter()
        .filter(|obs| obs.city == city)
        .map(|obs| obs.temperature)
        .collect();
    if temperatures.is_empty() {
        return None;
    }

    let count = temperatures.len();
    let mean = temperatures.iter().sum::<f64>() / count as f64;
    let std = if count < 2 {
        None
    } else {
        let sum_sq: f64 = temperatures
            .iter()
            .map(|t| {
                let diff = t - mean;
                diff * diff
            })
            .sum();
        Some((sum_sq / (count as f64 - 1.0)).sqrt())
    };
    let min = temperatures.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = temperatures
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);

    Some(CitySummary {
        city: city.to_string(),
        count,
        mean,
        std,
        min,
        max,
    })
}
