//! Signal and machine identity models
//!
//! These are the records exchanged with the collector and persisted by the
//! local store. Nested signal data (source, context, decisions) is value
//! owned: it is copied in whole with its signal and never shared or mutated
//! from outside.

use serde::{Deserialize, Serialize};

/// Identity record for a machine that authenticates against the collector.
///
/// One record per machine id. The password is generated once at first
/// registration and must remain stable across logins; the token is an opaque
/// JWT bearer credential, absent until the first login succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineIdentity {
    pub machine_id: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub scenarios: Vec<String>,
}

impl MachineIdentity {
    /// New identity with no session token yet.
    pub fn new(machine_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            machine_id: machine_id.into(),
            password: password.into(),
            token: None,
            scenarios: Vec::new(),
        }
    }
}

/// An observed security event queued for delivery to the collector.
///
/// `id` is assigned by the store on first persistence; `None` means the
/// signal has not been persisted yet. `sent` starts false and is flipped to
/// true only after the batch containing the signal was pushed successfully;
/// it never reverts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub machine_id: String,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_trust: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub uuid: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_at: Option<String>,
    #[serde(default)]
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<Decision>,
}

/// Originating source of a signal.
///
/// Timestamps and address fields are carried opaquely in the format the
/// detector produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Source {
    /// Source describing a single observed IP address.
    pub fn from_ip(ip: impl Into<String>) -> Self {
        let ip = ip.into();
        Self {
            scope: Some("ip".to_string()),
            value: Some(ip.clone()),
            ip: Some(ip),
            ..Self::default()
        }
    }

    /// Fill in the scope from the populated address field.
    ///
    /// An `ip` wins over a `range`; an already-set scope is replaced when
    /// either address field is present.
    #[must_use]
    pub fn with_inferred_scope(mut self) -> Self {
        if self.ip.is_some() {
            self.scope = Some("ip".to_string());
        } else if self.range.is_some() {
            self.scope = Some("range".to_string());
        }
        self
    }
}

/// Key/value context attached to a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub key: String,
    pub value: String,
}

/// A remediation decision attached to a signal by the local detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulated: Option<bool>,
}

/// A remediation decision returned by the collector's decision stream.
///
/// Read-only: produced by the remote service and never persisted locally.
/// The collector capitalizes these field names on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedDecision {
    #[serde(rename = "Duration")]
    pub duration: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<String>,
    #[serde(rename = "Scenario")]
    pub scenario: Option<String>,
    #[serde(rename = "Scope")]
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_inferred_from_ip_over_range() {
        let source = Source {
            ip: Some("1.1.1.172".to_string()),
            range: Some("1.1.1.0/24".to_string()),
            scope: Some("Ip".to_string()),
            ..Source::default()
        }
        .with_inferred_scope();

        assert_eq!(source.scope.as_deref(), Some("ip"));
    }

    #[test]
    fn scope_inferred_from_range_when_no_ip() {
        let source =
            Source { range: Some("10.0.0.0/8".to_string()), ..Source::default() }.with_inferred_scope();

        assert_eq!(source.scope.as_deref(), Some("range"));
    }

    #[test]
    fn scope_kept_when_no_address_fields() {
        let source =
            Source { scope: Some("country".to_string()), ..Source::default() }.with_inferred_scope();

        assert_eq!(source.scope.as_deref(), Some("country"));
    }

    #[test]
    fn received_decision_parses_capitalized_wire_names() {
        let raw = r#"{"Duration": "4h", "Value": "1.2.3.4", "Scenario": "watchpost/ssh-bf", "Scope": "Ip"}"#;
        let decision: ReceivedDecision = serde_json::from_str(raw).unwrap();

        assert_eq!(decision.duration.as_deref(), Some("4h"));
        assert_eq!(decision.value.as_deref(), Some("1.2.3.4"));
        assert_eq!(decision.scenario.as_deref(), Some("watchpost/ssh-bf"));
        assert_eq!(decision.scope.as_deref(), Some("Ip"));
    }

    #[test]
    fn unpersisted_signal_serializes_without_id() {
        let signal = Signal {
            id: None,
            machine_id: "m1".to_string(),
            scenario: "watchpost/ssh-bf".to_string(),
            scenario_version: None,
            scenario_hash: None,
            scenario_trust: None,
            message: None,
            uuid: "u-1".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            start_at: None,
            stop_at: None,
            sent: false,
            source: None,
            context: Vec::new(),
            decisions: Vec::new(),
        };

        let json = serde_json::to_value(&signal).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["sent"], serde_json::json!(false));
    }
}
