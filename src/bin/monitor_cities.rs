use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use temp_anomaly_service::config::Config;
use temp_anomaly_service::fetch_error::FetchError;
use temp_anomaly_service::fetcher::WeatherFetcher;
use temp_anomaly_service::monitor::{check_cities, check_cities_sequential, CityCheck};
use temp_anomaly_service::stats_store;

#[derive(Parser)]
#[command(name = "monitor-cities")]
#[command(about = "Check current city temperatures against seasonal baselines", long_about = None)]
struct Cli {
    /// Seasonal stats artifact produced by analyze-history
    #[arg(long, default_value = "stats.csv")]
    stats: PathBuf,

    /// Cities to check
    #[arg(required = true)]
    cities: Vec<String>,

    /// Fetch one city at a time instead of fanning out concurrently
    #[arg(long)]
    sequential: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,temp_anomaly_service=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()
        .map_err(|_| "OPENWEATHER_API_KEY must be set (via the environment or a .env file)")?;

    let stats = stats_store::load_stats(&cli.stats)?;
    info!(
        "Loaded {} seasonal stat rows from {}",
        stats.len(),
        cli.stats.display()
    );

    let fetcher = WeatherFetcher::with_base_url(
        config.weather_api_url.clone(),
        config.openweather_api_key.clone(),
    );

    let start = Instant::now();
    let checks = if cli.sequential {
        check_cities_sequential(&fetcher, &cli.cities, &stats, Utc::now()).await
    } else {
        check_cities(&fetcher, &cli.cities, &stats, Utc::now()).await
    };
    let elapsed = start.elapsed();

    for city in &cli.cities {
        if let Some(check) = checks.get(city) {
            println!("{}", report_line(check));
        }
    }
    println!(
        "Checked {} cities in {elapsed:.2?} ({})",
        cli.cities.len(),
        if cli.sequential { "sequential" } else { "concurrent" }
    );

    Ok(())
}

fn report_line(check: &CityCheck) -> String {
    let city = &check.reading.city;
    match check.reading.temperature {
        Some(temperature) => match (check.season_mean, check.season_std) {
            (Some(mean), Some(std)) => {
                if check.is_anomaly {
                    format!(
                        "{city}: {temperature:.2}°C -> ANOMALY (seasonal mean {mean:.2}°C, std {std:.2}°C)"
                    )
                } else {
                    format!(
                        "{city}: {temperature:.2}°C within the normal range (seasonal mean {mean:.2}°C, std {std:.2}°C)"
                    )
                }
            }
            _ => format!(
                "{city}: {temperature:.2}°C - no baseline for the current season, cannot classify"
            ),
        },
        None => match &check.error {
            Some(FetchError::Unauthorized) => format!(
                "{city}: fetch failed - the weather source rejected the API credential, check OPENWEATHER_API_KEY"
            ),
            Some(error) => format!("{city}: fetch failed - {error}"),
            None => format!("{city}: no reading available"),
        },
    }
}
