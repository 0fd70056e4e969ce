//! Data-source collaborator interfaces.
//!
//! The mail, calendar and task fetchers live outside this crate. They plug
//! into the orchestrator through [`Source`]; reply-state and relationship
//! annotation plugs in through [`Enricher`].

mod collect;
mod item;

pub use collect::{collect_all, Collected, SourceFailure, SourceStatus};
pub use item::{ItemAnnotations, ItemRef, SourceItem};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SourceError, ValidationError};

/// Which upstream a tracked item came from.
///
/// Doubles as the snooze `source_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Email,
    Task,
    Calendar,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Email => "email",
            SourceKind::Task => "task",
            SourceKind::Calendar => "calendar",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" | "mail" => Ok(SourceKind::Email),
            "task" | "tasks" => Ok(SourceKind::Task),
            "calendar" | "event" | "events" => Ok(SourceKind::Calendar),
            other => Err(ValidationError::UnknownSourceKind(other.to_string())),
        }
    }
}

/// One independently fetchable upstream (messages, events or tasks).
#[async_trait]
pub trait Source: Send + Sync {
    /// What kind of items this source yields.
    fn kind(&self) -> SourceKind;

    /// Name used in logs and in the failure list handed to the reasoning step.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Fetch the current items. Timeouts are the source's own business.
    async fn fetch(&self) -> Result<Vec<SourceItem>, SourceError>;
}

/// Best-effort annotation of fetched items.
///
/// Implementations must not fail the cycle: an item that cannot be
/// annotated is returned unchanged.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, items: Vec<SourceItem>) -> Vec<SourceItem>;
}

/// Enricher that leaves items untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnricher;

#[async_trait]
impl Enricher for NoopEnricher {
    async fn enrich(&self, items: Vec<SourceItem>) -> Vec<SourceItem> {
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_parses_aliases() {
        assert_eq!("Email".parse::<SourceKind>().unwrap(), SourceKind::Email);
        assert_eq!("events".parse::<SourceKind>().unwrap(), SourceKind::Calendar);
        assert_eq!("tasks".parse::<SourceKind>().unwrap(), SourceKind::Task);
        assert!("sms".parse::<SourceKind>().is_err());
    }

    #[test]
    fn source_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SourceKind::Calendar).unwrap();
        assert_eq!(json, "\"calendar\"");
    }
}
