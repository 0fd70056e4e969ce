//! Per-item re-notification suppression.
//!
//! An item is *active* until a user action snoozes it, *snoozed* while
//! `snooze_until` lies in the future, and *active* again once that moment
//! passes or it is explicitly un-snoozed. Expiry is lazy: checks compare
//! against the current time and rows are only removed by [`SnoozeStore::purge`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::sources::{ItemRef, SourceItem, SourceKind};
use crate::storage::{Database, SnoozeConfig};

/// Snooze state of one item at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SnoozeState {
    Active,
    Snoozed { until: DateTime<Utc> },
}

impl SnoozeState {
    /// Derive the state from a stored expiry.
    pub fn at(snooze_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match snooze_until {
            Some(until) if until > now => SnoozeState::Snoozed { until },
            _ => SnoozeState::Active,
        }
    }

    pub fn is_snoozed(&self) -> bool {
        matches!(self, SnoozeState::Snoozed { .. })
    }
}

/// The two snooze durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnoozePolicy {
    pub item: Duration,
    pub all: Duration,
}

impl From<&SnoozeConfig> for SnoozePolicy {
    fn from(cfg: &SnoozeConfig) -> Self {
        Self {
            item: Duration::minutes(i64::from(cfg.item_minutes)),
            all: Duration::minutes(i64::from(cfg.all_minutes)),
        }
    }
}

impl Default for SnoozePolicy {
    fn default() -> Self {
        Self::from(&SnoozeConfig::default())
    }
}

impl SnoozePolicy {
    pub fn item_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.item
    }

    pub fn all_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.all
    }
}

/// Snooze operations over the database.
pub struct SnoozeStore<'a> {
    db: &'a Database,
    policy: SnoozePolicy,
}

impl<'a> SnoozeStore<'a> {
    pub fn new(db: &'a Database, policy: SnoozePolicy) -> Self {
        Self { db, policy }
    }

    /// Snooze one item for the per-item duration.
    pub fn snooze_item(
        &self,
        kind: SourceKind,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, DatabaseError> {
        let until = self.policy.item_until(now);
        self.db.snooze(kind, id, until)?;
        Ok(until)
    }

    /// Snooze a custom duration.
    pub fn snooze_for(
        &self,
        kind: SourceKind,
        id: &str,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Result<DateTime<Utc>, DatabaseError> {
        let until = now + duration;
        self.db.snooze(kind, id, until)?;
        Ok(until)
    }

    /// Snooze every item for the "snooze everything" duration.
    pub fn snooze_all(
        &self,
        items: &[ItemRef],
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, DatabaseError> {
        let until = self.policy.all_until(now);
        for item in items {
            self.db.snooze(item.kind, &item.id, until)?;
        }
        Ok(until)
    }

    pub fn unsnooze(&self, kind: SourceKind, id: &str) -> Result<bool, DatabaseError> {
        self.db.unsnooze(kind, id)
    }

    pub fn purge(&self, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
        self.db.purge_expired_snoozes(now)
    }

    /// Drop snoozed items in place, returning how many were removed.
    ///
    /// `items` is left untouched when a lookup fails.
    pub fn filter_active(
        &self,
        items: &mut Vec<SourceItem>,
        now: DateTime<Utc>,
    ) -> Result<usize, DatabaseError> {
        let snoozed = items
            .iter()
            .map(|item| self.db.is_snoozed(item.kind, item.snooze_key(), now))
            .collect::<Result<Vec<bool>, _>>()?;
        let before = items.len();
        let mut flags = snoozed.into_iter();
        items.retain(|_| !flags.next().unwrap_or(false));
        Ok(before - items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn state_follows_expiry() {
        let until = now() + Duration::minutes(5);
        assert_eq!(SnoozeState::at(None, now()), SnoozeState::Active);
        assert!(SnoozeState::at(Some(until), now()).is_snoozed());
        assert_eq!(SnoozeState::at(Some(until), until), SnoozeState::Active);
    }

    #[test]
    fn policy_uses_config_minutes() {
        let policy = SnoozePolicy::from(&SnoozeConfig {
            item_minutes: 30,
            all_minutes: 90,
        });
        assert_eq!(policy.item_until(now()), now() + Duration::minutes(30));
        assert_eq!(policy.all_until(now()), now() + Duration::minutes(90));
    }

    #[test]
    fn snoozing_twice_leaves_one_row_with_latest_expiry() {
        let db = Database::open_memory().unwrap();
        let store = SnoozeStore::new(&db, SnoozePolicy::default());
        store.snooze_item(SourceKind::Email, "thread-1", now()).unwrap();
        let later = now() + Duration::minutes(10);
        let until = store.snooze_item(SourceKind::Email, "thread-1", later).unwrap();

        let rows = db.list_snoozes().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].snooze_until, until);
    }

    #[test]
    fn snooze_then_expire_returns_to_active() {
        let db = Database::open_memory().unwrap();
        let store = SnoozeStore::new(&db, SnoozePolicy::default());
        let until = store.snooze_item(SourceKind::Task, "t-1", now()).unwrap();

        assert!(db.is_snoozed(SourceKind::Task, "t-1", now()).unwrap());
        assert!(!db.is_snoozed(SourceKind::Task, "t-1", until).unwrap());
        assert_eq!(store.purge(until).unwrap(), 1);
        assert!(db.list_snoozes().unwrap().is_empty());
    }

    #[test]
    fn filter_active_drops_snoozed_threads() {
        let db = Database::open_memory().unwrap();
        let store = SnoozeStore::new(&db, SnoozePolicy::default());
        store.snooze_item(SourceKind::Email, "thread-1", now()).unwrap();

        let mut items = vec![
            SourceItem::new(SourceKind::Email, "m1", "a").with_conversation("thread-1"),
            SourceItem::new(SourceKind::Email, "m2", "b").with_conversation("thread-2"),
            SourceItem::new(SourceKind::Task, "thread-1", "same id, other kind"),
        ];
        let filtered = store.filter_active(&mut items, now()).unwrap();
        assert_eq!(filtered, 1);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.id != "m1"));
    }

    #[test]
    fn snooze_all_uses_long_duration() {
        let db = Database::open_memory().unwrap();
        let policy = SnoozePolicy {
            item: Duration::minutes(10),
            all: Duration::minutes(60),
        };
        let store = SnoozeStore::new(&db, policy);
        let refs = vec![
            ItemRef {
                kind: SourceKind::Email,
                id: "thread-1".into(),
            },
            ItemRef {
                kind: SourceKind::Calendar,
                id: "evt-1".into(),
            },
        ];
        let until = store.snooze_all(&refs, now()).unwrap();
        assert_eq!(until, now() + Duration::minutes(60));
        assert_eq!(db.list_snoozes().unwrap().len(), 2);
    }
}
