//! Integration tests for configuration loading from files and environment

use std::io::Write;

use tempfile::TempDir;
use watchpost_domain::constants::DEFAULT_COLLECTOR_URL;
use watchpost_infra::config::{load_from_env, load_from_file};

#[test]
fn loads_json_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"{{"database": {{"path": "signals.db", "pool_size": 6}},
            "collector": {{"base_url": "https://collector.example.com/v2"}}}}"#
    )
    .unwrap();

    let config = load_from_file(Some(path)).unwrap();
    assert_eq!(config.database.path, "signals.db");
    assert_eq!(config.database.pool_size, 6);
    assert_eq!(config.collector.base_url, "https://collector.example.com/v2");
}

#[test]
fn loads_toml_config_file_with_collector_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watchpost.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        "[database]\npath = \"signals.db\"\n"
    )
    .unwrap();

    let config = load_from_file(Some(path)).unwrap();
    assert_eq!(config.database.path, "signals.db");
    assert_eq!(config.collector.base_url, DEFAULT_COLLECTOR_URL);
}

#[test]
fn env_loading_requires_database_path() {
    // Single test touches these process-wide variables to avoid races.
    std::env::remove_var("WATCHPOST_DB_PATH");
    assert!(load_from_env().is_err());

    std::env::set_var("WATCHPOST_DB_PATH", "/tmp/watchpost-env-test.db");
    std::env::set_var("WATCHPOST_COLLECTOR_URL", "https://collector.env.example.com/v2");
    let config = load_from_env().unwrap();
    assert_eq!(config.database.path, "/tmp/watchpost-env-test.db");
    assert_eq!(config.collector.base_url, "https://collector.env.example.com/v2");

    std::env::remove_var("WATCHPOST_DB_PATH");
    std::env::remove_var("WATCHPOST_COLLECTOR_URL");
}
