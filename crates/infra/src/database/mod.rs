//! SQLite-backed implementation of the sync store port

pub mod manager;
pub mod sync_store;

pub use manager::DbManager;
pub use sync_store::SqliteSyncStore;
