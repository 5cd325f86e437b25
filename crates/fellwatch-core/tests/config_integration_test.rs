//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Config file > Defaults

use fellwatch_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig, CONFIG_FILE_NAME};
use fellwatch_core::models::{DedupPolicy, LayerKind};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_full_precedence_chain() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
accuracy_threshold = 20.0
buffer_distance = 100.0
dedup = "per-pair"
"#,
    )
    .unwrap();

    let mut config = LayeredConfig::with_defaults(dir.path()).load_from_file(&path).unwrap();
    config.update_from_cli(CliConfigOverrides {
        buffer_distance: Some(30.0),
        ..Default::default()
    });

    assert_eq!(config.accuracy_threshold.value, 20.0);
    assert_eq!(config.accuracy_threshold.source, ConfigSource::File);
    assert_eq!(config.buffer_distance.value, 30.0);
    assert_eq!(config.buffer_distance.source, ConfigSource::Cli);
    assert_eq!(config.dedup.value, DedupPolicy::PerPair);
    assert_eq!(config.header_offset.source, ConfigSource::Default);

    let resolved = config.resolve().unwrap();
    assert_eq!(resolved.buffer_distance, 30.0);
    assert_eq!(resolved.accuracy_threshold, 20.0);
}

#[test]
fn test_relative_paths_follow_the_file() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("settings");
    fs::create_dir(&nested).unwrap();
    let path = nested.join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
input_dir = "fynd"
map_dir = "../kartor"
processed_dir = "/tmp/fellwatch-out"
"#,
    )
    .unwrap();

    let resolved = LayeredConfig::with_defaults("/data")
        .load_from_file(&path)
        .unwrap()
        .resolve()
        .unwrap();

    assert_eq!(resolved.input_dir, nested.join("fynd"));
    assert_eq!(resolved.map_dir, nested.join("../kartor"));
    assert_eq!(
        resolved.output_file,
        std::path::PathBuf::from("/tmp/fellwatch-out/analysis_results.xlsx")
    );
}

#[test]
fn test_custom_columns_and_layers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
keep_columns = ["Art", "X", "Y", "Datum"]

[columns]
east = "X"
north = "Y"
accuracy = "Precision"
quantity = "Count"
species = "Art"
date = "Datum"
region = "Region"

[[layers]]
kind = "reported"
file = "anmalda.shp"
date_column = "Inkomdatum"
"#,
    )
    .unwrap();

    let resolved = LayeredConfig::with_defaults(dir.path())
        .load_from_file(&path)
        .unwrap()
        .resolve()
        .unwrap();

    assert_eq!(resolved.columns.east, "X");
    assert!(resolved.columns.is_numeric("Precision"));
    assert!(!resolved.columns.is_numeric("Art"));
    assert_eq!(resolved.layers.len(), 1);
    assert!(resolved.layer(LayerKind::Reported).is_some());
    assert!(resolved.layer(LayerKind::Executed).is_none());
}

#[test]
fn test_file_missing_coordinate_column_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "keep_columns = [\"Artnamn\", \"Ost\"]\n").unwrap();

    let config = LayeredConfig::with_defaults(dir.path()).load_from_file(&path).unwrap();
    assert!(config.resolve().is_err());
}
