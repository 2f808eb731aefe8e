//! Id derivation and signal construction helpers

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::MACHINE_ID_LENGTH;
use crate::types::{Signal, Source};

/// Derive a stable machine id from an arbitrary key.
///
/// The key is hashed with SHA-256 and hex encoded, so the same key always
/// yields the same machine id and the key itself never appears on the wire.
pub fn machine_id_from_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(MACHINE_ID_LENGTH);
    id
}

impl Signal {
    /// New unsent signal for a scenario observed from `source`.
    ///
    /// Assigns a fresh uuid and stamps `created_at`/`start_at`/`stop_at` with
    /// the current time; callers refine the window afterwards if the event
    /// spans one.
    pub fn observed(
        machine_id: impl Into<String>,
        scenario: impl Into<String>,
        source: Source,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: None,
            machine_id: machine_id.into(),
            scenario: scenario.into(),
            scenario_version: None,
            scenario_hash: None,
            scenario_trust: None,
            message: None,
            uuid: Uuid::new_v4().to_string(),
            created_at: now.clone(),
            start_at: Some(now.clone()),
            stop_at: Some(now),
            sent: false,
            source: Some(source.with_inferred_scope()),
            context: Vec::new(),
            decisions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_id_is_stable_and_bounded() {
        let a = machine_id_from_key("1.2.3.6");
        let b = machine_id_from_key("1.2.3.6");
        let c = machine_id_from_key("1.2.3.7");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), MACHINE_ID_LENGTH);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn observed_signal_starts_unsent_with_ip_scope() {
        let signal = Signal::observed("machine-1", "watchpost/ssh-bf", Source::from_ip("1.2.3.4"));

        assert!(!signal.sent);
        assert!(signal.id.is_none());
        assert_eq!(signal.source.as_ref().unwrap().scope.as_deref(), Some("ip"));
        assert!(!signal.uuid.is_empty());
    }
}
