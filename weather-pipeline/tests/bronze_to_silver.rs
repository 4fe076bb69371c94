//! End-to-end runs from a bronze directory to a Silver CSV.

use std::fs;

use chrono::DateTime;
use serde_json::json;
use tempfile::TempDir;
use weather_pipeline::{BatchMetadata, BronzeStore, SilverPipeline};

fn metadata() -> BatchMetadata {
    BatchMetadata::new(DateTime::from_timestamp(1_700_100_000, 0).unwrap())
}

fn tel_aviv() -> serde_json::Value {
    json!({
        "main": {"temp": 300.0, "temp_min": 295.0, "temp_max": 305.0},
        "sys": {"sunrise": 1700000000, "sunset": 1700040000, "country": "IL"},
        "dt": 1700020000,
        "weather": [{"main": "Clear"}],
        "wind": {"speed": 3.1, "deg": 180},
        "visibility": 8000,
        "clouds": {"all": 10},
        "coord": {"lon": 34.88, "lat": 32.08},
        "name": "TelAviv",
        "id": 1
    })
}

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn cell<'a>(header: &[String], row: &'a [String], name: &str) -> &'a str {
    let idx = header.iter().position(|h| h == name).unwrap();
    &row[idx]
}

#[test]
fn writes_one_row_per_readable_file_and_records_failures() {
    let bronze = TempDir::new().unwrap();
    let silver = TempDir::new().unwrap();
    let at = DateTime::from_timestamp(1_700_020_000, 0).unwrap();

    let store = BronzeStore::new(bronze.path());
    store.save("tel_aviv_il", &tel_aviv(), at).unwrap();
    store
        .save("haifa_il", &json!({"name": "Haifa", "weather": [{"main": "Tornado"}]}), at)
        .unwrap();
    fs::write(bronze.path().join("weather_broken.json"), "{ not json").unwrap();
    fs::write(bronze.path().join("weather_array.json"), "[1, 2, 3]").unwrap();
    fs::write(bronze.path().join("README.txt"), "notes").unwrap();

    let summary = SilverPipeline::new()
        .unwrap()
        .run(bronze.path(), silver.path(), &metadata())
        .unwrap();

    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors.len(), 3);

    let output = summary.output.expect("a Silver file should be written");
    let (header, rows) = read_csv(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(header.first().map(String::as_str), Some("City ID"));
    assert_eq!(header.last().map(String::as_str), Some("Load Datetime"));
    assert!(!header.iter().any(|h| h == "base" || h == "cod"));

    // Files are processed in name order: haifa before tel_aviv.
    let haifa = &rows[0];
    assert_eq!(cell(&header, haifa, "City"), "Haifa");
    assert_eq!(cell(&header, haifa, "Weather Category"), "Other");
    assert_eq!(cell(&header, haifa, "Country"), "Unknown");
    assert_eq!(cell(&header, haifa, "Temperature"), "0");
    assert_eq!(cell(&header, haifa, "Is Daytime"), "");

    let tel_aviv = &rows[1];
    assert_eq!(cell(&header, tel_aviv, "City"), "TelAviv");
    assert_eq!(cell(&header, tel_aviv, "Weather Category"), "Clear");
    assert_eq!(cell(&header, tel_aviv, "Is Daytime"), "true");
    assert_eq!(cell(&header, tel_aviv, "Visibility in KM"), "8");
    assert_eq!(cell(&header, tel_aviv, "Day Length"), "40000");
    assert_eq!(cell(&header, tel_aviv, "Time of Data"), "2023-11-15T03:46:40Z");
    let temp: f64 = cell(&header, tel_aviv, "Temperature").parse().unwrap();
    assert!((temp - 26.85).abs() < 1e-9);
}

#[test]
fn empty_bronze_directory_writes_nothing() {
    let bronze = TempDir::new().unwrap();
    let silver = TempDir::new().unwrap();

    let summary = SilverPipeline::new()
        .unwrap()
        .run(bronze.path(), silver.path(), &metadata())
        .unwrap();

    assert_eq!(summary.successful, 0);
    assert!(summary.output.is_none());
    assert_eq!(fs::read_dir(silver.path()).unwrap().count(), 0);
}

#[test]
fn only_undecodable_files_writes_nothing() {
    let bronze = TempDir::new().unwrap();
    let silver = TempDir::new().unwrap();
    fs::write(bronze.path().join("a.json"), "nope").unwrap();

    let summary = SilverPipeline::new()
        .unwrap()
        .run(bronze.path(), silver.path(), &metadata())
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert!(summary.output.is_none());
    assert_eq!(fs::read_dir(silver.path()).unwrap().count(), 0);
}

#[test]
fn schema_mismatch_aborts_before_any_file_is_written() {
    use weather_pipeline::model::{Column, FieldValue, OutputRecord};
    use weather_pipeline::{PipelineError, RawObservation, silver, transform::assemble};

    let silver_dir = TempDir::new().unwrap();
    let pipeline = SilverPipeline::new().unwrap();
    let good = pipeline.process(&RawObservation::from_value("a.json", tel_aviv()).unwrap());
    let odd = OutputRecord::new(
        "odd.json",
        vec![Column::new("City", FieldValue::Text(Some("Eilat".into())))],
    );

    let result = assemble(vec![good, odd], &metadata())
        .and_then(|batch| silver::write_batch(&batch, silver_dir.path(), metadata().load_datetime));

    assert!(matches!(result, Err(PipelineError::SchemaMismatch { index: 1, .. })));
    assert_eq!(fs::read_dir(silver_dir.path()).unwrap().count(), 0);
}
