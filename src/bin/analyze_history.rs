use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use temp_anomaly_service::analysis::{
    describe_city, results_match, run_parallel, run_sequential,
};
use temp_anomaly_service::dataset::{
    distinct_cities, filter_by_date_range, load_observations, save_annotated,
};
use temp_anomaly_service::stats_store;

#[derive(Parser)]
#[command(name = "analyze-history")]
#[command(about = "Analyze historical city temperatures and flag seasonal anomalies", long_about = None)]
struct Cli {
    /// Historical observations CSV with columns: city, timestamp, temperature, season
    #[arg(long)]
    input: PathBuf,

    /// Where to write the seasonal stats artifact read by monitor-cities
    #[arg(long, default_value = "stats.csv")]
    stats_out: PathBuf,

    /// Optional output path for the annotated dataset
    #[arg(long)]
    annotated_out: Option<PathBuf>,

    /// Moving-average window, in observations per city
    #[arg(long, env = "MOVING_AVG_WINDOW", default_value_t = 30)]
    window: usize,

    /// Cap the parallel worker pool (defaults to available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Keep only observations on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Keep only observations on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Print per-city descriptive statistics before the analysis
    #[arg(long)]
    describe: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,temp_anomaly_service=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.window == 0 {
        return Err("--window must be at least 1".into());
    }
    if let Some(workers) = cli.workers {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global()?;
        info!("Parallel worker pool capped at {} threads", workers);
    }

    let mut observations = load_observations(&cli.input)?;
    info!(
        "Loaded {} observations from {}",
        observations.len(),
        cli.input.display()
    );

    let from = cli.from.map(start_of_day);
    let to = cli.to.map(end_of_day);
    if from.is_some() || to.is_some() {
        observations = filter_by_date_range(&observations, from, to);
        info!("{} observations left after date filter", observations.len());
        if observations.is_empty() {
            return Err("no observations in the selected date range".into());
        }
    }

    let cities = distinct_cities(&observations);
    info!("Dataset covers {} cities", cities.len());

    if cli.describe {
        for city in &cities {
            if let Some(summary) = describe_city(&observations, city) {
                let std = summary
                    .std
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "{}: {} readings, mean {:.2}°C, std {std}°C, min {:.2}°C, max {:.2}°C",
                    summary.city, summary.count, summary.mean, summary.min, summary.max
                );
            }
        }
    }

    let start = Instant::now();
    let sequential = run_sequential(&observations, cli.window);
    let sequential_elapsed = start.elapsed();
    println!("Sequential analysis took {sequential_elapsed:.2?}");

    let start = Instant::now();
    let parallel = run_parallel(&observations, cli.window)?;
    let parallel_elapsed = start.elapsed();
    // On small datasets the parallel run is usually slower than the
    // sequential one: dispatch overhead dominates per-city work.
    println!("Parallel analysis took {parallel_elapsed:.2?}");

    if results_match(&sequential, &parallel) {
        println!("Sequential and parallel results match");
    } else {
        return Err("sequential and parallel results diverge".into());
    }

    println!(
        "Flagged {} anomalies across {} observations",
        sequential.anomaly_count(),
        sequential.annotated.len()
    );

    stats_store::save_stats(&cli.stats_out, &sequential.stats)?;
    info!(
        "Wrote {} seasonal stat rows to {}",
        sequential.stats.len(),
        cli.stats_out.display()
    );

    if let Some(annotated_out) = &cli.annotated_out {
        save_annotated(annotated_out, &sequential.annotated)?;
        info!("Wrote annotated dataset to {}", annotated_out.display());
    }

    Ok(())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0).unwrap(), Utc)
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_hms_opt(23, 59, 59).unwrap(), Utc)
}
