// End-to-end batch flow over real files: load a CSV dataset, run the
// pipeline, persist the stats artifact, and read it back the way the
// monitoring path does.

use temp_anomaly_service::analysis::run_sequential;
use temp_anomaly_service::dataset::{load_observations, save_annotated, DatasetError, Season};
use temp_anomaly_service::stats_store;

const SAMPLE_CSV: &str = "\
city,timestamp,temperature,season
Berlin,2024-01-01,1.5,Winter
Berlin,2024-01-02,-0.5,Winter
Berlin,2024-01-03,2.0,Winter
Berlin,2024-07-01,21.0,Summer
Moscow,2024-01-01,-9.0,Winter
Moscow,2024-01-02,-11.0,Winter
";

#[test]
fn test_load_analyze_persist_reload() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    std::fs::write(&input, SAMPLE_CSV).unwrap();

    let observations = load_observations(&input).unwrap();
    assert_eq!(observations.len(), 6);

    let result = run_sequential(&observations, 7);
    assert_eq!(result.annotated.len(), 6);
    // (Berlin, Winter), (Berlin, Summer), (Moscow, Winter)
    assert_eq!(result.stats.len(), 3);

    let stats_path = dir.path().join("stats.csv");
    stats_store::save_stats(&stats_path, &result.stats).unwrap();
    let reloaded = stats_store::load_stats(&stats_path).unwrap();
    assert_eq!(reloaded.len(), 3);

    let berlin_summer = reloaded
        .iter()
        .find(|stat| stat.city == "Berlin" && stat.season == Season::Summer)
        .unwrap();
    assert_eq!(berlin_summer.season_mean, 21.0);
    // A single summer observation has no defined spread.
    assert!(berlin_summer.season_std.is_none());

    let moscow_winter = reloaded
        .iter()
        .find(|stat| stat.city == "Moscow" && stat.season == Season::Winter)
        .unwrap();
    assert_eq!(moscow_winter.season_mean, -10.0);
    assert!(moscow_winter.season_std.is_some());
}

#[test]
fn test_annotated_dataset_is_written_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    std::fs::write(&input, SAMPLE_CSV).unwrap();

    let observations = load_observations(&input).unwrap();
    let result = run_sequential(&observations, 7);

    let out = dir.path().join("annotated.csv");
    save_annotated(&out, &result.annotated).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next().unwrap(),
        "city,timestamp,temperature,season,moving_avg,season_mean,season_std,is_anomaly"
    );
    assert_eq!(lines.count(), 6);
}

#[test]
fn test_validation_fails_fast_before_any_computation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.csv");
    std::fs::write(
        &input,
        "city,timestamp,temperature\nBerlin,2024-01-01,1.5\n",
    )
    .unwrap();

    match load_observations(&input).unwrap_err() {
        DatasetError::MissingColumn(column) => assert_eq!(column, "season"),
        other => panic!("Expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = load_observations(std::path::Path::new("/nonexistent/history.csv"));
    assert!(matches!(result, Err(DatasetError::Io(_))));
}
