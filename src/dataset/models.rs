use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Calendar season used to bucket observations for the baseline statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Map a calendar month (1-12) to its season.
    ///
    /// Dec-Feb -> Winter, Mar-May -> Spring, Jun-Aug -> Summer, Sep-Nov -> Autumn.
    pub fn from_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

impl FromStr for Season {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Winter" => Ok(Season::Winter),
            "Spring" => Ok(Season::Spring),
            "Summer" => Ok(Season::Summer),
            "Autumn" => Ok(Season::Autumn),
            _ => Err("expected one of Winter, Spring, Summer, Autumn"),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single historical temperature observation.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub city: String,
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius.
    pub temperature: f64,
    pub season: Season,
}

/// Per-(city, season) temperature baseline derived from historical observations.
///
/// `season_std` is the sample standard deviation (n-1 denominator) and is `None`
/// for a group with a single observation, which has no defined spread. A missing
/// row for a (city, season) pair means that pair cannot be classified.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonalStat {
    pub city: String,
    pub season: Season,
    pub season_mean: f64,
    pub season_std: Option<f64>,
}

/// An observation annotated with its moving average and anomaly classification.
///
/// `moving_avg` is always defined; the first points of a city's series use a
/// partial window. `season_mean`/`season_std` are `None` when the baseline has
/// no coverage for the observation's (city, season), in which case `is_anomaly`
/// is false by construction (undetermined, not confidently normal).
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedObservation {
    pub city: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub season: Season,
    pub moving_avg: f64,
    pub season_mean: Option<f64>,
    pub season_std: Option<f64>,
    pub is_anomaly: bool,
}

/// A current temperature fetched from the live weather source.
///
/// `temperature` is `None` when the fetch for that city failed; a failed
/// reading is never coerced to a number.
#[derive(Debug, Clone, Serialize)]
pub struct LiveReading {
    pub city: String,
    pub temperature: Option<f64>,
}
