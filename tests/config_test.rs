//! Configuration tests
//!
//! This module contains tests for the configuration system.

use std::fs;

use broadcast_relay::config::{Args, ConfigBuilder, RelayConfig, ValueSource};
use clap::Parser;

/// Test default configuration
#[test]
fn test_default_config() {
    let config = RelayConfig::default();

    assert_eq!(config.listen().to_string(), "127.0.0.1:9090");
    assert_eq!(config.upstream().to_string(), "127.0.0.1:9990");
    assert_eq!(config.log_level(), "debug");
    assert_eq!(config.buffer_size(), 1024);
}

/// Test configuration from file
#[test]
fn test_file_config() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = dir.path().join("relay.json");
    fs::write(
        &config_path,
        r#"{
            "listen": "127.0.0.1:9000",
            "upstream": "127.0.0.1:8000",
            "log_level": "info",
            "buffer_size": 4096
        }"#,
    )
    .expect("Failed to write test config file");

    let config = ConfigBuilder::new()
        .with_defaults()
        .with_file(&config_path)
        .build()
        .expect("Failed to load config from file");

    assert_eq!(config.listen().to_string(), "127.0.0.1:9000");
    assert_eq!(config.upstream().to_string(), "127.0.0.1:8000");
    assert_eq!(config.log_level(), "info");
    assert_eq!(config.buffer_size(), 4096);
    assert_eq!(config.source("upstream"), Some(ValueSource::File));
    assert_eq!(config.config_file(), Some(config_path.as_path()));
}

/// Unknown keys in a file are an error, not silently ignored
#[test]
fn test_file_config_unknown_field() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = dir.path().join("relay.json");
    fs::write(&config_path, r#"{ "target": "127.0.0.1:8000" }"#).unwrap();

    let result = ConfigBuilder::new().with_defaults().with_file(&config_path).build();
    assert!(result.is_err());
}

/// Test configuration from command line arguments
#[test]
fn test_cli_config() {
    let args = Args::try_parse_from([
        "broadcast-relay",
        "--listen", "127.0.0.1:6000",
        "--upstream", "127.0.0.1:4000",
        "--log-level", "error",
        "--buffer-size", "2048",
    ])
    .expect("Failed to parse arguments");

    let config = ConfigBuilder::new()
        .with_defaults()
        .with_cli(args)
        .build()
        .expect("Failed to build config with command line arguments");

    assert_eq!(config.listen().to_string(), "127.0.0.1:6000");
    assert_eq!(config.upstream().to_string(), "127.0.0.1:4000");
    assert_eq!(config.log_level(), "error");
    assert_eq!(config.buffer_size(), 2048);
    assert_eq!(config.source("listen"), Some(ValueSource::CommandLine));
}

/// Listening on the upstream address is rejected
#[test]
fn test_listen_equals_upstream() {
    let args = Args::try_parse_from([
        "broadcast-relay",
        "--listen", "127.0.0.1:6000",
        "--upstream", "127.0.0.1:6000",
    ])
    .unwrap();

    let err = ConfigBuilder::new()
        .with_defaults()
        .with_cli(args)
        .build()
        .expect_err("identical addresses must be rejected");
    assert!(err.to_string().contains("different"));
}
