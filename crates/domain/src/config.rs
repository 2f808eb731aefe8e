//! Configuration structures
//!
//! Plain data; loading and path probing live in the infra crate.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COLLECTOR_URL, DEFAULT_DB_POOL_SIZE, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

/// Local signal store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path
    pub path: String,
    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Remote collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Base URL of the collector API, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for collector requests, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_base_url() -> String {
    DEFAULT_COLLECTOR_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_defaults_fill_missing_fields() {
        let config: Config =
            serde_json::from_str(r#"{"database": {"path": "signals.db"}}"#).unwrap();

        assert_eq!(config.database.path, "signals.db");
        assert_eq!(config.database.pool_size, DEFAULT_DB_POOL_SIZE);
        assert_eq!(config.collector.base_url, DEFAULT_COLLECTOR_URL);
        assert_eq!(config.collector.timeout_seconds, DEFAULT_HTTP_TIMEOUT_SECS);
    }
}
