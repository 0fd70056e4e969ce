use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::{ItemRef, SourceFailure, SourceItem, SourceKind, SourceStatus};
use crate::storage::CheckinRecord;

/// Everything the reasoning step sees for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub cycle_id: String,
    pub generated_at: DateTime<Utc>,
    /// Wall-clock time in the configured zone, `YYYY-MM-DD HH:MM`.
    pub local_time: String,
    pub weekend: bool,
    pub messages: Vec<SourceItem>,
    pub events: Vec<SourceItem>,
    pub tasks: Vec<SourceItem>,
    pub sources: Vec<SourceStatus>,
    pub failures: Vec<SourceFailure>,
    pub recent_checkins: Vec<CheckinRecord>,
    /// Items removed before reasoning because they are snoozed.
    pub snoozed_filtered: usize,
}

impl DecisionContext {
    /// Split collected items into the three buckets by kind.
    pub fn bucket(items: Vec<SourceItem>) -> (Vec<SourceItem>, Vec<SourceItem>, Vec<SourceItem>) {
        let mut messages = Vec::new();
        let mut events = Vec::new();
        let mut tasks = Vec::new();
        for item in items {
            match item.kind {
                SourceKind::Email => messages.push(item),
                SourceKind::Calendar => events.push(item),
                SourceKind::Task => tasks.push(item),
            }
        }
        (messages, events, tasks)
    }

    pub fn items(&self) -> impl Iterator<Item = &SourceItem> {
        self.messages
            .iter()
            .chain(self.events.iter())
            .chain(self.tasks.iter())
    }

    pub fn item_count(&self) -> usize {
        self.messages.len() + self.events.len() + self.tasks.len()
    }

    /// Snoozable identities of every item, deduplicated, in context order.
    pub fn item_refs(&self) -> Vec<ItemRef> {
        let mut refs: Vec<ItemRef> = Vec::new();
        for item in self.items() {
            let r = item.item_ref();
            if !refs.contains(&r) {
                refs.push(r);
            }
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(items: Vec<SourceItem>) -> DecisionContext {
        let (messages, events, tasks) = DecisionContext::bucket(items);
        DecisionContext {
            cycle_id: "20260303120000-abc123".into(),
            generated_at: Utc::now(),
            local_time: "2026-03-03 12:00".into(),
            weekend: false,
            messages,
            events,
            tasks,
            sources: Vec::new(),
            failures: Vec::new(),
            recent_checkins: Vec::new(),
            snoozed_filtered: 0,
        }
    }

    #[test]
    fn buckets_by_kind() {
        let ctx = context(vec![
            SourceItem::new(SourceKind::Task, "t1", "Renew passport"),
            SourceItem::new(SourceKind::Email, "m1", "Re: lease"),
            SourceItem::new(SourceKind::Calendar, "e1", "Dentist"),
            SourceItem::new(SourceKind::Email, "m2", "Lunch?"),
        ]);
        assert_eq!(ctx.messages.len(), 2);
        assert_eq!(ctx.events.len(), 1);
        assert_eq!(ctx.tasks.len(), 1);
        assert_eq!(ctx.item_count(), 4);
    }

    #[test]
    fn item_refs_collapse_email_threads() {
        let ctx = context(vec![
            SourceItem::new(SourceKind::Email, "m1", "a").with_conversation("thread-1"),
            SourceItem::new(SourceKind::Email, "m2", "b").with_conversation("thread-1"),
            SourceItem::new(SourceKind::Task, "t1", "c"),
        ]);
        let refs = ctx.item_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "thread-1");
        assert_eq!(refs[1].kind, SourceKind::Task);
    }
}
