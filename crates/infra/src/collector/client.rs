//! Collector client facade
//!
//! Drives the full sync cycle: queue signals locally, resolve credentials
//! per machine, push pending signals in bounded batches, fetch decisions,
//! and enroll machines. All work is strictly sequential (one machine at a
//! time, one batch at a time), so a machine's credentials are always
//! resolved and persisted before any batch is pushed under its token.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, instrument};
use watchpost_core::{batch_plan, group_unsent_by_machine, scenario_set, SyncStore};
use watchpost_domain::{CollectorConfig, ReceivedDecision, Signal};

use super::credentials::CredentialManager;
use super::errors::CollectorError;
use super::{endpoint, DECISIONS_PATH, ENROLL_PATH, SIGNALS_PATH};
use crate::http::HttpClient;

/// Client for the remote signal collector.
pub struct CollectorClient {
    store: Arc<dyn SyncStore>,
    credentials: CredentialManager,
    http: HttpClient,
    config: CollectorConfig,
}

#[derive(Debug, Serialize)]
struct SignalsRequest<'a> {
    signals: &'a [Signal],
}

#[derive(Debug, Serialize)]
struct EnrollRequest<'a> {
    name: &'a str,
    overwrite: bool,
    attachment_key: &'a str,
    tags: &'a [String],
}

impl CollectorClient {
    /// Create a client over the given store.
    pub fn new(store: Arc<dyn SyncStore>, config: CollectorConfig) -> Result<Self, CollectorError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let credentials =
            CredentialManager::new(Arc::clone(&store), http.clone(), config.clone());

        Ok(Self { store, credentials, http, config })
    }

    /// Queue signals in the local store for a later `send_signals`.
    pub async fn add_signals(&self, signals: &[Signal]) -> Result<(), CollectorError> {
        for signal in signals {
            self.store.upsert_signal(signal).await?;
        }
        Ok(())
    }

    /// Push every pending signal to the collector.
    ///
    /// Pending signals are grouped by machine; each machine's credentials are
    /// resolved (registering or logging in as needed, with the group's
    /// scenario set) before its signals go out in batches of at most 250.
    /// Each successfully pushed batch is marked sent before the next one is
    /// attempted, so a mid-run failure leaves exactly the already-pushed
    /// batches marked.
    ///
    /// When `prune_after_send` is set, every stored signal with `sent = true`
    /// is deleted afterwards, including signals sent on previous runs, not
    /// only the ones pushed by this call.
    #[instrument(skip(self))]
    pub async fn send_signals(&self, prune_after_send: bool) -> Result<(), CollectorError> {
        let signals = self.store.get_all_signals().await?;
        let pending = group_unsent_by_machine(signals);

        if pending.is_empty() {
            debug!("no pending signals");
        }

        for (machine_id, group) in &pending {
            let scenarios = scenario_set(group);
            let token = self.credentials.resolve_token(machine_id, &scenarios).await?;
            self.dispatch_batches(&token, group).await?;
            info!(machine_id = %machine_id, count = group.len(), "machine signals dispatched");
        }

        if prune_after_send {
            self.prune_sent_signals().await?;
        }

        Ok(())
    }

    /// Fetch the current decision list for an operator machine.
    ///
    /// Resolves credentials for `machine_id` first (registering or logging
    /// in as needed), then issues a single authenticated GET; the response
    /// body is assumed complete.
    #[instrument(skip(self, scenarios), fields(machine_id = %machine_id))]
    pub async fn get_decisions(
        &self,
        machine_id: &str,
        scenarios: &[String],
    ) -> Result<Vec<ReceivedDecision>, CollectorError> {
        let token = self.credentials.resolve_token(machine_id, scenarios).await?;

        let url = endpoint(&self.config.base_url, DECISIONS_PATH);
        let builder = self.http.request(Method::GET, &url).header(AUTHORIZATION, &token);
        let response = self.http.send_checked(builder).await?;

        let decisions: Vec<ReceivedDecision> = response.json().await.map_err(|err| {
            CollectorError::Transport(format!("malformed decision response: {err}"))
        })?;

        debug!(count = decisions.len(), "decisions fetched");
        Ok(decisions)
    }

    /// Enroll machines against an operator account.
    ///
    /// Machines are processed sequentially and independently, each under its
    /// own resolved token; a failure aborts the remaining machine ids, so
    /// callers re-invoke with the unprocessed tail if needed.
    #[instrument(skip(self, machine_ids, tags), fields(machines = machine_ids.len()))]
    pub async fn enroll_machines(
        &self,
        machine_ids: &[String],
        name: &str,
        attachment_key: &str,
        tags: &[String],
    ) -> Result<(), CollectorError> {
        let url = endpoint(&self.config.base_url, ENROLL_PATH);

        for machine_id in machine_ids {
            let token = self.credentials.resolve_token(machine_id, &[]).await?;
            let body = EnrollRequest { name, overwrite: true, attachment_key, tags };

            let builder =
                self.http.request(Method::POST, &url).header(AUTHORIZATION, &token).json(&body);
            self.http.send_checked(builder).await?;

            info!(machine_id = %machine_id, "machine enrolled");
        }

        Ok(())
    }

    /// Push one machine's signals in bounded batches under its token.
    async fn dispatch_batches(
        &self,
        token: &str,
        signals: &[Signal],
    ) -> Result<(), CollectorError> {
        let url = endpoint(&self.config.base_url, SIGNALS_PATH);

        for batch in batch_plan(signals) {
            let body = SignalsRequest { signals: batch };
            let builder =
                self.http.request(Method::POST, &url).header(AUTHORIZATION, token).json(&body);
            self.http.send_checked(builder).await?;

            for signal in batch {
                let mut sent = signal.clone();
                sent.sent = true;
                self.store.upsert_signal(&sent).await?;
            }

            debug!(count = batch.len(), "signal batch pushed");
        }

        Ok(())
    }

    /// Delete every stored signal already marked sent.
    async fn prune_sent_signals(&self) -> Result<(), CollectorError> {
        let ids: Vec<i64> = self
            .store
            .get_all_signals()
            .await?
            .into_iter()
            .filter(|signal| signal.sent)
            .filter_map(|signal| signal.id)
            .collect();

        if ids.is_empty() {
            return Ok(());
        }

        let removed = self.store.delete_signals(&ids).await?;
        info!(removed, "pruned sent signals");
        Ok(())
    }
}
