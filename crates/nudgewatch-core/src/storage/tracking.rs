//! Per-conversation email notification state. Rows are never deleted.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::database::{parse_ts, ts, Database};
use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTracking {
    pub conversation_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_notified: Option<DateTime<Utc>>,
    pub reply_detected: bool,
}

fn row_to_tracking(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmailTracking> {
    let first_seen: String = row.get(1)?;
    let last_notified: Option<String> = row.get(2)?;
    Ok(EmailTracking {
        conversation_id: row.get(0)?,
        first_seen: parse_ts(&first_seen)?,
        last_notified: last_notified.as_deref().map(parse_ts).transpose()?,
        reply_detected: row.get(3)?,
    })
}

impl Database {
    /// Record that a conversation was seen. Existing rows keep their `first_seen`.
    /// Returns whether a new row was created.
    pub fn observe_conversation(
        &self,
        conversation_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let inserted = self.lock()?.execute(
            "INSERT OR IGNORE INTO email_tracking (conversation_id, first_seen, reply_detected)
             VALUES (?1, ?2, 0)",
            params![conversation_id, ts(at)],
        )?;
        Ok(inserted > 0)
    }

    /// Flag that the user replied in a conversation, creating the row if needed.
    pub fn mark_reply_detected(
        &self,
        conversation_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.lock()?.execute(
            "INSERT INTO email_tracking (conversation_id, first_seen, reply_detected)
             VALUES (?1, ?2, 1)
             ON CONFLICT(conversation_id) DO UPDATE SET reply_detected = 1",
            params![conversation_id, ts(at)],
        )?;
        Ok(())
    }

    /// Stamp `last_notified`, creating the row if needed.
    pub fn mark_notified(
        &self,
        conversation_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.lock()?.execute(
            "INSERT INTO email_tracking (conversation_id, first_seen, last_notified, reply_detected)
             VALUES (?1, ?2, ?2, 0)
             ON CONFLICT(conversation_id) DO UPDATE SET last_notified = excluded.last_notified",
            params![conversation_id, ts(at)],
        )?;
        Ok(())
    }

    /// The user dealt with the conversation: replied and notified both set.
    pub fn mark_handled(
        &self,
        conversation_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.lock()?.execute(
            "INSERT INTO email_tracking (conversation_id, first_seen, last_notified, reply_detected)
             VALUES (?1, ?2, ?2, 1)
             ON CONFLICT(conversation_id) DO UPDATE SET
                reply_detected = 1,
                last_notified = excluded.last_notified",
            params![conversation_id, ts(at)],
        )?;
        Ok(())
    }

    pub fn email_tracking(
        &self,
        conversation_id: &str,
    ) -> Result<Option<EmailTracking>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT conversation_id, first_seen, last_notified, reply_detected
             FROM email_tracking WHERE conversation_id = ?1",
        )?;
        Ok(stmt
            .query_row(params![conversation_id], row_to_tracking)
            .optional()?)
    }

    /// All tracked conversations, most recently seen first.
    pub fn list_email_tracking(&self) -> Result<Vec<EmailTracking>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT conversation_id, first_seen, last_notified, reply_detected
             FROM email_tracking ORDER BY first_seen DESC, conversation_id",
        )?;
        let rows = stmt.query_map([], row_to_tracking)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
