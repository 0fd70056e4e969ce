//! SQLite-backed state.
//!
//! Provides persistent storage for:
//! - The "last completed cycle" pointer and pause flag (key-value table)
//! - The check-in log of decided cycles
//! - Snoozed items
//! - Email conversation tracking

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use tracing::warn;

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::gating::LastCycleSource;

const KEY_LAST_CYCLE_AT: &str = "last_cycle_at";
const KEY_PAUSED: &str = "paused";

/// SQLite database for orchestrator state.
///
/// The connection sits behind a mutex so the database can be shared
/// between the orchestrator and action handlers. Guards are never held
/// across an `.await`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/nudgewatch/nudgewatch.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("nudgewatch.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::Poisoned)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Timestamp of the last completed cycle, if any.
    pub fn get_last_cycle_at(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        match self.kv_get(KEY_LAST_CYCLE_AT)? {
            Some(raw) => parse_ts(&raw).map(Some).map_err(Into::into),
            None => Ok(None),
        }
    }

    pub fn set_last_cycle_at(&self, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.kv_set(KEY_LAST_CYCLE_AT, &ts(at))
    }

    pub fn is_paused(&self) -> Result<bool, DatabaseError> {
        Ok(self.kv_get(KEY_PAUSED)?.as_deref() == Some("true"))
    }

    pub fn set_paused(&self, paused: bool) -> Result<(), DatabaseError> {
        self.kv_set(KEY_PAUSED, if paused { "true" } else { "false" })
    }
}

impl LastCycleSource for Database {
    /// Read errors are logged and treated as "no previous cycle".
    fn last_cycle_at(&self) -> Option<DateTime<Utc>> {
        match self.get_last_cycle_at() {
            Ok(at) => at,
            Err(e) => {
                warn!(error = %e, "failed to read last cycle timestamp");
                None
            }
        }
    }
}

/// Fixed-width UTC timestamps so SQL string comparison orders correctly.
pub(crate) fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}
