//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes a short list of paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `WATCHPOST_DB_PATH`: Signal store file path (required for env loading)
//! - `WATCHPOST_DB_POOL_SIZE`: Connection pool size
//! - `WATCHPOST_COLLECTOR_URL`: Collector base URL
//! - `WATCHPOST_HTTP_TIMEOUT_SECS`: Collector request timeout
//!
//! ## File Locations
//! The loader probes `./config.{json,toml}` then `./watchpost.{json,toml}`.

use std::path::{Path, PathBuf};

use watchpost_domain::{CollectorConfig, Config, DatabaseConfig, Result, WatchpostError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `WatchpostError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `WATCHPOST_DB_PATH` is required; the remaining variables fall back to
/// their defaults when unset.
///
/// # Errors
/// Returns `WatchpostError::Config` if the database path is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("WATCHPOST_DB_PATH")?;

    let defaults = CollectorConfig::default();

    let pool_size = match std::env::var("WATCHPOST_DB_POOL_SIZE") {
        Ok(raw) => raw
            .parse::<u32>()
            .map_err(|e| WatchpostError::Config(format!("Invalid pool size: {e}")))?,
        Err(_) => watchpost_domain::constants::DEFAULT_DB_POOL_SIZE,
    };

    let base_url = std::env::var("WATCHPOST_COLLECTOR_URL").unwrap_or(defaults.base_url);

    let timeout_seconds = match std::env::var("WATCHPOST_HTTP_TIMEOUT_SECS") {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| WatchpostError::Config(format!("Invalid HTTP timeout: {e}")))?,
        Err(_) => defaults.timeout_seconds,
    };

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        collector: CollectorConfig {
            base_url,
            timeout_seconds,
            user_agent: defaults.user_agent,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `WatchpostError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(WatchpostError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            WatchpostError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| WatchpostError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by file
/// extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| WatchpostError::Config(format!("Invalid TOML config: {e}"))),
        _ => serde_json::from_str(contents)
            .map_err(|e| WatchpostError::Config(format!("Invalid JSON config: {e}"))),
    }
}

fn probe_config_paths() -> Option<PathBuf> {
    const CANDIDATES: [&str; 4] =
        ["config.json", "config.toml", "watchpost.json", "watchpost.toml"];

    CANDIDATES.iter().copied().map(PathBuf::from).find(|candidate| candidate.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| WatchpostError::Config(format!("Missing environment variable: {name}")))
}

#[cfg(test)]
mod tests {
    use watchpost_domain::constants::DEFAULT_COLLECTOR_URL;

    use super::*;

    #[test]
    fn parses_json_config() {
        let contents = r#"{
            "database": {"path": "signals.db", "pool_size": 8},
            "collector": {"base_url": "https://collector.example.com/v2"}
        }"#;

        let config = parse_config(contents, Path::new("config.json")).unwrap();
        assert_eq!(config.database.path, "signals.db");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.collector.base_url, "https://collector.example.com/v2");
    }

    #[test]
    fn parses_toml_config_with_defaults() {
        let contents = r#"
            [database]
            path = "signals.db"
        "#;

        let config = parse_config(contents, Path::new("config.toml")).unwrap();
        assert_eq!(config.database.path, "signals.db");
        assert_eq!(config.collector.base_url, DEFAULT_COLLECTOR_URL);
    }

    #[test]
    fn rejects_malformed_content() {
        assert!(parse_config("not json", Path::new("config.json")).is_err());
        assert!(parse_config("not = [toml", Path::new("config.toml")).is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/watchpost.json"))).unwrap_err();
        assert!(matches!(err, WatchpostError::Config(_)));
    }
}
