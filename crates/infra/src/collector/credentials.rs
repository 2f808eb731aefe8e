//! Per-machine credential lifecycle
//!
//! Decides, for one machine identity at a time, whether to register, log in,
//! or reuse the stored session token, and keeps the store in step with every
//! credential the collector hands out.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use watchpost_core::SyncStore;
use watchpost_domain::constants::MACHINE_PASSWORD_BYTES;
use watchpost_domain::{CollectorConfig, MachineIdentity};

use super::errors::CollectorError;
use super::{endpoint, token, LOGIN_PATH, REGISTER_PATH};
use crate::http::HttpClient;

/// Resolves a usable session token per machine, registering and logging in
/// as needed.
pub struct CredentialManager {
    store: Arc<dyn SyncStore>,
    http: HttpClient,
    config: CollectorConfig,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    machine_id: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    machine_id: &'a str,
    password: &'a str,
    scenarios: &'a [String],
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

impl CredentialManager {
    /// Create a manager over the given store and HTTP client.
    pub fn new(store: Arc<dyn SyncStore>, http: HttpClient, config: CollectorConfig) -> Self {
        Self { store, http, config }
    }

    /// Return an identity holding a currently valid token for `machine_id`.
    ///
    /// A machine never seen before is registered (with a freshly generated
    /// password) and logged in; a machine whose stored token expired is
    /// logged in again with its stored password and the supplied scenario
    /// set. Every branch that obtains a token persists the identity before
    /// returning. A machine with a valid stored token makes no network call.
    #[instrument(skip(self, scenarios), fields(machine_id = %machine_id))]
    pub async fn resolve(
        &self,
        machine_id: &str,
        scenarios: &[String],
    ) -> Result<MachineIdentity, CollectorError> {
        match self.store.get_machine_by_id(machine_id).await? {
            None => {
                let mut machine = MachineIdentity::new(machine_id, generate_password());
                machine.scenarios = scenarios.to_vec();
                self.register(&machine).await?;
                self.login(machine).await
            }
            Some(machine) if machine.token.as_deref().is_some_and(token::is_current) => {
                debug!("reusing stored token");
                Ok(machine)
            }
            Some(stored) => {
                let mut machine = MachineIdentity::new(machine_id, stored.password);
                machine.scenarios = scenarios.to_vec();
                self.login(machine).await
            }
        }
    }

    /// Resolve and unwrap the bearer token itself.
    pub async fn resolve_token(
        &self,
        machine_id: &str,
        scenarios: &[String],
    ) -> Result<String, CollectorError> {
        let machine = self.resolve(machine_id, scenarios).await?;
        machine.token.ok_or_else(|| {
            CollectorError::Credential(format!("no token resolved for {machine_id}"))
        })
    }

    /// Register the machine with the collector and persist its identity.
    async fn register(&self, machine: &MachineIdentity) -> Result<(), CollectorError> {
        let url = endpoint(&self.config.base_url, REGISTER_PATH);
        let body = RegisterRequest {
            machine_id: &machine.machine_id,
            password: &machine.password,
        };

        let builder = self.http.request(Method::POST, &url).json(&body);
        self.http.send_checked(builder).await?;
        self.store.upsert_machine(machine).await?;

        info!(machine_id = %machine.machine_id, "machine registered");
        Ok(())
    }

    /// Log the machine in, then persist the identity with its fresh token.
    async fn login(&self, mut machine: MachineIdentity) -> Result<MachineIdentity, CollectorError> {
        let url = endpoint(&self.config.base_url, LOGIN_PATH);
        let body = LoginRequest {
            machine_id: &machine.machine_id,
            password: &machine.password,
            scenarios: &machine.scenarios,
        };

        let builder = self.http.request(Method::POST, &url).json(&body);
        let response = self.http.send_checked(builder).await?;
        let login: LoginResponse = response
            .json()
            .await
            .map_err(|err| CollectorError::Transport(format!("malformed login response: {err}")))?;

        machine.token = Some(login.token);
        self.store.upsert_machine(&machine).await?;

        info!(machine_id = %machine.machine_id, "session token refreshed");
        Ok(machine)
    }
}

/// Random URL-safe machine password.
fn generate_password() -> String {
    let mut bytes = [0u8; MACHINE_PASSWORD_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_passwords_are_long_unique_and_url_safe() {
        let first = generate_password();
        let second = generate_password();

        assert_ne!(first, second);
        assert!(first.len() >= MACHINE_PASSWORD_BYTES);
        assert!(first
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }
}
