use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceKind;

/// A single fetched item: an email thread, calendar event or task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    pub kind: SourceKind,
    /// Upstream identifier, unique within `kind`.
    pub id: String,
    /// Email conversation the item belongs to, when it is an email.
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub detail: String,
    /// Received time, event start or task due time.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub annotations: ItemAnnotations,
}

/// Metadata added by the enricher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemAnnotations {
    /// How the sender relates to the user ("manager", "family", ...).
    #[serde(default)]
    pub relationship: Option<String>,
    /// The user already replied in this conversation.
    #[serde(default)]
    pub reply_detected: bool,
    /// A previous cycle already notified about this conversation.
    #[serde(default)]
    pub already_notified: bool,
}

impl SourceItem {
    pub fn new(kind: SourceKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            conversation_id: None,
            title: title.into(),
            detail: String::new(),
            at: None,
            annotations: ItemAnnotations::default(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_at(mut self, at: DateTime<Utc>) -> Self {
        self.at = Some(at);
        self
    }

    /// Identifier used for snoozing: the conversation for emails, the item id otherwise.
    pub fn snooze_key(&self) -> &str {
        match self.kind {
            SourceKind::Email => self.conversation_id.as_deref().unwrap_or(&self.id),
            SourceKind::Task | SourceKind::Calendar => &self.id,
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            kind: self.kind,
            id: self.snooze_key().to_string(),
        }
    }
}

/// The snoozable identity of an item, `(source_type, source_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: SourceKind,
    pub id: String,
}
