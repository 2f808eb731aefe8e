//! Shared helpers for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use tempfile::TempDir;
use watchpost_domain::{
    CollectorConfig, ContextEntry, Decision, MachineIdentity, Signal, Source,
};
use watchpost_infra::database::{DbManager, SqliteSyncStore};

/// Forge a JWT with the given expiry claim. The signature is junk: the
/// engine never verifies it.
pub fn forge_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    format!("{header}.{payload}.test-signature")
}

pub fn valid_token() -> String {
    forge_token(Utc::now().timestamp() + 3_600)
}

pub fn expired_token() -> String {
    forge_token(Utc::now().timestamp() - 3_600)
}

/// Open a migrated store on a fresh database file inside `dir`.
pub fn disk_store(dir: &TempDir) -> Arc<SqliteSyncStore> {
    let db_path = dir.path().join("watchpost-test.db");
    let manager = DbManager::new(&db_path, 2).expect("db manager created");
    manager.run_migrations().expect("migrations run");
    Arc::new(SqliteSyncStore::new(Arc::new(manager)))
}

/// Collector configuration pointed at a mock server.
pub fn collector_config(base_url: &str) -> CollectorConfig {
    CollectorConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
        user_agent: "watchpost-tests".to_string(),
    }
}

/// An unsent signal with realistic nested data.
pub fn sample_signal(machine_id: &str, scenario: &str) -> Signal {
    let mut signal = Signal::observed(machine_id, scenario, Source::from_ip("1.1.1.172"));
    signal.scenario_version = Some("0.1".to_string());
    signal.scenario_trust = Some("trusted".to_string());
    signal.scenario_hash =
        Some("4441dcff07020f6690d998b7101e642359ba405c2abb83565bbbdcee36de280f".to_string());
    signal.message = Some(format!("Ip 1.1.1.172 performed '{scenario}' (6 events)"));
    signal.context = vec![
        ContextEntry { key: "target_user".to_string(), value: "netflix".to_string() },
        ContextEntry { key: "service".to_string(), value: "ssh".to_string() },
    ];
    signal.decisions = vec![Decision {
        origin: Some("watchpost".to_string()),
        scenario: Some(scenario.to_string()),
        scope: Some("Ip".to_string()),
        value: Some("1.1.1.172".to_string()),
        kind: Some("ban".to_string()),
        duration: Some("59m49s".to_string()),
        simulated: Some(false),
        ..Decision::default()
    }];
    signal
}

/// A machine identity already holding a session token.
pub fn machine_with_token(machine_id: &str, password: &str, token: String) -> MachineIdentity {
    MachineIdentity {
        machine_id: machine_id.to_string(),
        password: password.to_string(),
        token: Some(token),
        scenarios: Vec::new(),
    }
}
