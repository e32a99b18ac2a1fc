use serde::Serialize;

/// Width of the anomaly band in standard deviations.
///
/// Fixed alongside the n-1 sample deviation used by `season_stats`; changing
/// either constant silently changes the anomaly rate.
pub const ANOMALY_SIGMA: f64 = 2.0;

/// Outcome of classifying one temperature against a seasonal baseline.
///
/// When the baseline has no coverage, `is_anomaly` is false and both bounds
/// are `None`: an explicit "cannot determine", distinct from a confident
/// "not anomalous".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub is_anomaly: bool,
    pub season_mean: Option<f64>,
    pub season_std: Option<f64>,
}

impl Classification {
    pub fn undetermined() -> Self {
        Classification {
            is_anomaly: false,
            season_mean: None,
            season_std: None,
        }
    }
}

/// Classify a temperature against a (mean, std) seasonal baseline.
///
/// Anomalous iff `temperature < mean - 2*std` or `temperature > mean + 2*std`;
/// values exactly on a bound are not anomalous. Pure function, no I/O.
pub fn classify(
    temperature: f64,
    season_mean: Option<f64>,
    season_std: Option<f64>,
) -> Classification {
    match (season_mean, season_std) {
        (Some(mean), Some(std)) => {
            let lower = mean - ANOMALY_SIGMA * std;
            let upper = mean + ANOMALY_SIGMA * std;
            Classification {
                is_anomaly: temperature < lower || temperature > upper,
                season_mean: Some(mean),
                season_std: Some(std),
            }
        }
        _ => Classification::undetermined(),
    }
}
