//! Domain constants
//!
//! Centralized location for domain-level constants used throughout the
//! engine.

// Signal dispatch
pub const MAX_SIGNAL_BATCH: usize = 250;

// Collector endpoints
pub const DEFAULT_COLLECTOR_URL: &str = "https://collector.watchpost.dev/v2";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("watchpost/", env!("CARGO_PKG_VERSION"));

// Credential generation
pub const MACHINE_PASSWORD_BYTES: usize = 32;
pub const MACHINE_ID_LENGTH: usize = 48;

// Storage defaults
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
