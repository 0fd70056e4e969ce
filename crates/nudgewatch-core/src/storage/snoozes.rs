//! Snoozed items table.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::database::{parse_ts, ts, Database};
use crate::error::DatabaseError;
use crate::sources::SourceKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoozedItem {
    pub source_type: SourceKind,
    pub source_id: String,
    pub snooze_until: DateTime<Utc>,
}

impl Database {
    /// Snooze an item until `until`. Re-snoozing overwrites the expiry.
    pub fn snooze(
        &self,
        kind: SourceKind,
        id: &str,
        until: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.lock()?.execute(
            "INSERT INTO snoozed_items (source_type, source_id, snooze_until, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source_type, source_id) DO UPDATE SET snooze_until = excluded.snooze_until",
            params![kind.as_str(), id, ts(until), ts(Utc::now())],
        )?;
        Ok(())
    }

    /// Remove a snooze. Returns whether a row existed.
    pub fn unsnooze(&self, kind: SourceKind, id: &str) -> Result<bool, DatabaseError> {
        let removed = self.lock()?.execute(
            "DELETE FROM snoozed_items WHERE source_type = ?1 AND source_id = ?2",
            params![kind.as_str(), id],
        )?;
        Ok(removed > 0)
    }

    /// Whether the item has a snooze that has not expired at `now`.
    ///
    /// Expired rows still present count as not snoozed.
    pub fn is_snoozed(
        &self,
        kind: SourceKind,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT 1 FROM snoozed_items
             WHERE source_type = ?1 AND source_id = ?2 AND snooze_until > ?3",
        )?;
        Ok(stmt.exists(params![kind.as_str(), id, ts(now)])?)
    }

    /// Delete every snooze whose expiry is at or before `now`.
    pub fn purge_expired_snoozes(&self, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let removed = self.lock()?.execute(
            "DELETE FROM snoozed_items WHERE snooze_until <= ?1",
            params![ts(now)],
        )?;
        Ok(removed)
    }

    /// All snooze rows, soonest expiry first.
    pub fn list_snoozes(&self) -> Result<Vec<SnoozedItem>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT source_type, source_id, snooze_until FROM snoozed_items
             ORDER BY snooze_until ASC, source_type, source_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (kind, source_id, until) = row?;
            let source_type = kind
                .parse::<SourceKind>()
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            out.push(SnoozedItem {
                source_type,
                source_id,
                snooze_until: parse_ts(&until)?,
            });
        }
        Ok(out)
    }
}
