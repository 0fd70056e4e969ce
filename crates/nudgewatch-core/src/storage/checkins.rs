//! Check-in log: one row per cycle that reached the decision stage.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::database::{parse_ts, ts, Database};
use crate::error::DatabaseError;
use crate::sources::ItemRef;

/// A persisted decided cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub cycle_id: String,
    pub checked_at: DateTime<Utc>,
    /// `NONE`, `TEXT` or `CALL`.
    pub decision: String,
    pub urgency: u8,
    pub summary: String,
    pub reasoning: String,
    #[serde(default)]
    pub sources_available: Vec<String>,
    #[serde(default)]
    pub sources_failed: Vec<String>,
    /// Items the cycle reasoned about; targets of "snooze everything".
    #[serde(default)]
    pub items: Vec<ItemRef>,
    /// Set when the cycle failed after deciding.
    #[serde(default)]
    pub error: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::QueryFailed(e.to_string()))
}

fn from_json<T: for<'de> Deserialize<'de>>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_checkin(row: &Row<'_>) -> rusqlite::Result<CheckinRecord> {
    let checked_at: String = row.get(1)?;
    let sources_available: String = row.get(6)?;
    let sources_failed: String = row.get(7)?;
    let items: String = row.get(8)?;
    Ok(CheckinRecord {
        cycle_id: row.get(0)?,
        checked_at: parse_ts(&checked_at)?,
        decision: row.get(2)?,
        urgency: row.get(3)?,
        summary: row.get(4)?,
        reasoning: row.get(5)?,
        sources_available: from_json(6, &sources_available)?,
        sources_failed: from_json(7, &sources_failed)?,
        items: from_json(8, &items)?,
        error: row.get(9)?,
    })
}

const SELECT_COLUMNS: &str = "SELECT cycle_id, checked_at, decision, urgency, summary, reasoning,
        sources_available, sources_failed, items, error
     FROM checkin_log";

impl Database {
    /// Insert a check-in row. Re-recording a cycle id replaces the row.
    pub fn record_checkin(&self, record: &CheckinRecord) -> Result<(), DatabaseError> {
        let sources_available = to_json(&record.sources_available)?;
        let sources_failed = to_json(&record.sources_failed)?;
        let items = to_json(&record.items)?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO checkin_log
                (cycle_id, checked_at, decision, urgency, summary, reasoning,
                 sources_available, sources_failed, items, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.cycle_id,
                ts(record.checked_at),
                record.decision,
                record.urgency,
                record.summary,
                record.reasoning,
                sources_available,
                sources_failed,
                items,
                record.error,
            ],
        )?;
        Ok(())
    }

    /// Most recent check-ins, newest first.
    pub fn recent_checkins(&self, limit: usize) -> Result<Vec<CheckinRecord>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY checked_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], row_to_checkin)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// The newest check-in that did not error.
    pub fn latest_decided_checkin(&self) -> Result<Option<CheckinRecord>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE error IS NULL ORDER BY checked_at DESC, id DESC LIMIT 1"
        ))?;
        match stmt.query_row([], row_to_checkin) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Keep only the newest `keep` rows. Returns how many were removed.
    pub fn trim_checkins(&self, keep: usize) -> Result<usize, DatabaseError> {
        let removed = self.lock()?.execute(
            "DELETE FROM checkin_log WHERE id NOT IN (
                SELECT id FROM checkin_log ORDER BY checked_at DESC, id DESC LIMIT ?1
            )",
            params![keep as i64],
        )?;
        Ok(removed)
    }
}
