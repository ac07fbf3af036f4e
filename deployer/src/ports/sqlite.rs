//! SQLite-backed port counter
//!
//! The counter lives in a single-row table. Every allocation runs in a
//! `BEGIN IMMEDIATE` transaction, which takes the database write lock
//! before the row is read, so the read-modify-write is serialized across
//! connections and processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::errors::PortError;
use crate::ports::store::{PortCounter, PortCounterStore};
use crate::ports::MAX_PORT;

const COUNTER_ROW_ID: i64 = 1;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS port_counter (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    current_port INTEGER NOT NULL,
    updated_at TEXT NOT NULL
)";

const INSERT_INITIAL: &str = "INSERT INTO port_counter (id, current_port, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(id) DO NOTHING";

/// Port counter stored in a SQLite database file
#[derive(Debug, Clone)]
pub struct SqlitePortStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqlitePortStore {
    /// Store backed by the database at `path`. Nothing is opened until the
    /// first call, so an unreachable database surfaces at allocation time.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// How long a connection waits for another writer's lock
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, PortError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PortError::StorageUnavailable(format!(
                    "failed to create '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(&self.path).map_err(|e| {
            PortError::StorageUnavailable(format!(
                "failed to open '{}': {e}",
                self.path.display()
            ))
        })?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute(CREATE_TABLE, [])?;
        Ok(conn)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

impl PortCounterStore for SqlitePortStore {
    fn initialize(&self, initial: i64) -> Result<(), PortError> {
        let conn = self.connect()?;
        conn.execute(INSERT_INITIAL, params![COUNTER_ROW_ID, initial, now()])?;
        Ok(())
    }

    fn take_next(&self, initial: i64) -> Result<i64, PortError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(INSERT_INITIAL, params![COUNTER_ROW_ID, initial, now()])?;
        let current: i64 = tx.query_row(
            "SELECT current_port FROM port_counter WHERE id = ?1",
            params![COUNTER_ROW_ID],
            |row| row.get(0),
        )?;
        if current > MAX_PORT {
            // dropping the transaction rolls it back
            return Err(PortError::Exhausted(current));
        }

        tx.execute(
            "UPDATE port_counter SET current_port = ?1, updated_at = ?2 WHERE id = ?3",
            params![current + 1, now(), COUNTER_ROW_ID],
        )?;
        tx.commit()?;

        debug!(current_port = current, next_port = current + 1, "advanced port counter");
        Ok(current)
    }

    fn peek(&self) -> Result<Option<PortCounter>, PortError> {
        let conn = self.connect()?;
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT current_port, updated_at FROM port_counter WHERE id = ?1",
                params![COUNTER_ROW_ID],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((current_port, updated_at)) = row else {
            return Ok(None);
        };
        let updated_at = DateTime::parse_from_rfc3339(&updated_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| PortError::StorageUnavailable(format!("corrupt updated_at: {e}")))?;

        Ok(Some(PortCounter {
            current_port,
            updated_at,
        }))
    }
}
