pub mod anomaly;
pub mod describe;
pub mod moving_average;
pub mod pipeline;
pub mod season_stats;

pub use anomaly::{classify, Classification, ANOMALY_SIGMA};
pub use describe::{describe_city, CitySummary};
pub use moving_average::moving_average;
pub use pipeline::{results_match, run_parallel, run_sequential, AnalysisError, AnalysisResult};
pub use season_stats::compute_season_stats;
