//! Database schema migrations for nudgewatch.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 1;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    debug!(version, "schema migrated");
    Ok(())
}

/// Migration v1: baseline tables.
///
/// - `kv`: small application state (last cycle pointer, pause flag)
/// - `checkin_log`: one row per decided cycle, with the items it covered
///   (JSON array of `{kind, id}`) for "snooze everything"
/// - `snoozed_items`: per-item re-notification suppression
/// - `email_tracking`: per-conversation notification state
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS checkin_log (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            cycle_id          TEXT NOT NULL UNIQUE,
            checked_at        TEXT NOT NULL,
            decision          TEXT NOT NULL,
            urgency           INTEGER NOT NULL,
            summary           TEXT NOT NULL DEFAULT '',
            reasoning         TEXT NOT NULL DEFAULT '',
            sources_available TEXT NOT NULL DEFAULT '[]',
            sources_failed    TEXT NOT NULL DEFAULT '[]',
            items             TEXT NOT NULL DEFAULT '[]',
            error             TEXT
        );

        CREATE TABLE IF NOT EXISTS snoozed_items (
            source_type  TEXT NOT NULL,
            source_id    TEXT NOT NULL,
            snooze_until TEXT NOT NULL,
            created_at   TEXT NOT NULL,
            PRIMARY KEY (source_type, source_id)
        );

        CREATE TABLE IF NOT EXISTS email_tracking (
            conversation_id TEXT PRIMARY KEY,
            first_seen      TEXT NOT NULL,
            last_notified   TEXT,
            reply_detected  INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_checkin_log_checked_at ON checkin_log(checked_at);
        CREATE INDEX IF NOT EXISTS idx_snoozed_items_until ON snoozed_items(snooze_until);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}
