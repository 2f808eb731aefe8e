//! SQLite-backed implementation of the sync store port.
//!
//! Scalar signal fields map to columns; the value-owned nested records
//! (source, context, decisions) are serialized whole into JSON text columns
//! and travel with their signal.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tokio::task;
use watchpost_core::SyncStore;
use watchpost_domain::{MachineIdentity, Result, Signal, WatchpostError};

use super::manager::DbManager;
use crate::errors::InfraError;

// Delete lists are bound as individual parameters; stay well under the
// SQLite host-parameter limit.
const DELETE_CHUNK: usize = 500;

/// SQLite-backed sync store.
pub struct SqliteSyncStore {
    db: Arc<DbManager>,
}

impl SqliteSyncStore {
    /// Construct a store backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn fetch_all_signals(conn: &Connection) -> Result<Vec<Signal>> {
        let mut stmt = conn.prepare(SIGNAL_SELECT_SQL).map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![], map_signal_row)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<Signal>>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    fn fetch_machine(conn: &Connection, machine_id: &str) -> Result<Option<MachineIdentity>> {
        conn.query_row(MACHINE_SELECT_SQL, params![machine_id], map_machine_row)
            .optional()
            .map_err(map_sql_error)
    }

    fn write_machine(conn: &Connection, machine: &MachineIdentity) -> Result<bool> {
        let scenarios = encode_json(&machine.scenarios)?;
        let updated = conn
            .execute(
                MACHINE_UPDATE_SQL,
                params![machine.password, machine.token, scenarios, machine.machine_id],
            )
            .map_err(map_sql_error)?;
        if updated > 0 {
            return Ok(false);
        }

        conn.execute(
            MACHINE_INSERT_SQL,
            params![machine.machine_id, machine.password, machine.token, scenarios],
        )
        .map_err(map_sql_error)?;
        Ok(true)
    }

    fn write_signal(conn: &Connection, signal: &Signal) -> Result<bool> {
        let source = signal.source.as_ref().map(encode_json).transpose()?;
        let context = encode_json(&signal.context)?;
        let decisions = encode_json(&signal.decisions)?;

        if let Some(id) = signal.id {
            let updated = conn
                .execute(
                    SIGNAL_UPDATE_SQL,
                    params![
                        signal.machine_id,
                        signal.scenario,
                        signal.scenario_version,
                        signal.scenario_hash,
                        signal.scenario_trust,
                        signal.message,
                        signal.uuid,
                        signal.created_at,
                        signal.start_at,
                        signal.stop_at,
                        signal.sent,
                        source,
                        context,
                        decisions,
                        id,
                    ],
                )
                .map_err(map_sql_error)?;
            if updated > 0 {
                return Ok(false);
            }
        }

        conn.execute(
            SIGNAL_INSERT_SQL,
            params![
                signal.id,
                signal.machine_id,
                signal.scenario,
                signal.scenario_version,
                signal.scenario_hash,
                signal.scenario_trust,
                signal.message,
                signal.uuid,
                signal.created_at,
                signal.start_at,
                signal.stop_at,
                signal.sent,
                source,
                context,
                decisions,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(true)
    }

    fn remove_signals(conn: &Connection, ids: &[i64]) -> Result<usize> {
        let mut removed = 0;
        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!("DELETE FROM signals WHERE id IN ({placeholders})");
            removed += conn
                .execute(&sql, params_from_iter(chunk.iter()))
                .map_err(map_sql_error)?;
        }
        Ok(removed)
    }

    fn remove_machines(conn: &Connection, machine_ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for chunk in machine_ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!("DELETE FROM machines WHERE machine_id IN ({placeholders})");
            removed += conn
                .execute(&sql, params_from_iter(chunk.iter()))
                .map_err(map_sql_error)?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl SyncStore for SqliteSyncStore {
    async fn get_all_signals(&self) -> Result<Vec<Signal>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<Signal>> {
            let conn = db.get_connection()?;
            Self::fetch_all_signals(&conn)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_machine_by_id(&self, machine_id: &str) -> Result<Option<MachineIdentity>> {
        let db = Arc::clone(&self.db);
        let machine_id = machine_id.to_string();

        task::spawn_blocking(move || -> Result<Option<MachineIdentity>> {
            let conn = db.get_connection()?;
            Self::fetch_machine(&conn, &machine_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert_machine(&self, machine: &MachineIdentity) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let machine = machine.clone();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            Self::write_machine(&conn, &machine)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert_signal(&self, signal: &Signal) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let signal = signal.clone();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            Self::write_signal(&conn, &signal)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete_signals(&self, ids: &[i64]) -> Result<usize> {
        let db = Arc::clone(&self.db);
        let ids = ids.to_vec();

        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            Self::remove_signals(&conn, &ids)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete_machines(&self, machine_ids: &[String]) -> Result<usize> {
        let db = Arc::clone(&self.db);
        let machine_ids = machine_ids.to_vec();

        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            Self::remove_machines(&conn, &machine_ids)
        })
        .await
        .map_err(map_join_error)?
    }
}

const SIGNAL_SELECT_SQL: &str = "SELECT
        id, machine_id, scenario, scenario_version, scenario_hash, scenario_trust,
        message, uuid, created_at, start_at, stop_at, sent,
        source_json, context_json, decisions_json
    FROM signals
    ORDER BY id ASC";

const SIGNAL_INSERT_SQL: &str = "INSERT INTO signals (
        id, machine_id, scenario, scenario_version, scenario_hash, scenario_trust,
        message, uuid, created_at, start_at, stop_at, sent,
        source_json, context_json, decisions_json
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

const SIGNAL_UPDATE_SQL: &str = "UPDATE signals SET
        machine_id = ?1, scenario = ?2, scenario_version = ?3, scenario_hash = ?4,
        scenario_trust = ?5, message = ?6, uuid = ?7, created_at = ?8,
        start_at = ?9, stop_at = ?10, sent = ?11,
        source_json = ?12, context_json = ?13, decisions_json = ?14
    WHERE id = ?15";

const MACHINE_SELECT_SQL: &str =
    "SELECT machine_id, password, token, scenarios FROM machines WHERE machine_id = ?1";

const MACHINE_INSERT_SQL: &str =
    "INSERT INTO machines (machine_id, password, token, scenarios) VALUES (?1, ?2, ?3, ?4)";

const MACHINE_UPDATE_SQL: &str =
    "UPDATE machines SET password = ?1, token = ?2, scenarios = ?3 WHERE machine_id = ?4";

fn map_signal_row(row: &Row<'_>) -> rusqlite::Result<Signal> {
    let source_json: Option<String> = row.get(12)?;
    let context_json: String = row.get(13)?;
    let decisions_json: String = row.get(14)?;

    Ok(Signal {
        id: row.get(0)?,
        machine_id: row.get(1)?,
        scenario: row.get(2)?,
        scenario_version: row.get(3)?,
        scenario_hash: row.get(4)?,
        scenario_trust: row.get(5)?,
        message: row.get(6)?,
        uuid: row.get(7)?,
        created_at: row.get(8)?,
        start_at: row.get(9)?,
        stop_at: row.get(10)?,
        sent: row.get(11)?,
        source: source_json.as_deref().map(|raw| decode_json(12, raw)).transpose()?,
        context: decode_json(13, &context_json)?,
        decisions: decode_json(14, &decisions_json)?,
    })
}

fn map_machine_row(row: &Row<'_>) -> rusqlite::Result<MachineIdentity> {
    let scenarios_json: String = row.get(3)?;

    Ok(MachineIdentity {
        machine_id: row.get(0)?,
        password: row.get(1)?,
        token: row.get(2)?,
        scenarios: decode_json(3, &scenarios_json)?,
    })
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|err| WatchpostError::Database(format!("failed to encode nested record: {err}")))
}

fn decode_json<T: serde::de::DeserializeOwned>(column: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })
}

fn map_sql_error(err: rusqlite::Error) -> WatchpostError {
    WatchpostError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> WatchpostError {
    WatchpostError::Internal(format!("blocking task failed: {err}"))
}
