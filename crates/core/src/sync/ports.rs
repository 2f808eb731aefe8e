//! Port interfaces for sync operations

use async_trait::async_trait;
use watchpost_domain::{MachineIdentity, Result, Signal};

/// Trait for the local signal and machine identity store.
///
/// This is the only storage surface the engine uses; backend-specific query
/// semantics must never leak through it. The store is assumed to have a
/// single writer at a time: the engine issues read-then-write sequences
/// without any atomicity guarantee of its own.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Fetch every stored signal, sent or not
    async fn get_all_signals(&self) -> Result<Vec<Signal>>;

    /// Look up a machine identity by machine id
    async fn get_machine_by_id(&self, machine_id: &str) -> Result<Option<MachineIdentity>>;

    /// Insert or update a machine identity; returns true when a new record
    /// was created
    async fn upsert_machine(&self, machine: &MachineIdentity) -> Result<bool>;

    /// Insert or update a signal; returns true when a new record was created.
    /// Signals without an id are always inserted and assigned one.
    async fn upsert_signal(&self, signal: &Signal) -> Result<bool>;

    /// Delete signals by store id; returns the number of rows removed
    async fn delete_signals(&self, ids: &[i64]) -> Result<usize>;

    /// Delete machine identities by machine id; returns the number of rows
    /// removed
    async fn delete_machines(&self, machine_ids: &[String]) -> Result<usize>;
}
