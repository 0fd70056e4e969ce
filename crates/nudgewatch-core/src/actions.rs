//! Button callbacks and other user actions.
//!
//! Identifiers are the strings carried by action buttons: a bare verb
//! (`snooze_all`, `pause`) or `verb:id` (`snooze_email:thread-42`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decision::ActionButton;
use crate::error::{Result, ValidationError};
use crate::snooze::{SnoozePolicy, SnoozeStore};
use crate::sources::SourceKind;
use crate::storage::Database;

/// A parsed action identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    Snooze { kind: SourceKind, id: String },
    SnoozeAll,
    Unsnooze { kind: SourceKind, id: String },
    MarkHandled { conversation_id: String },
    Pause,
    Resume,
    RunNow,
}

impl UserAction {
    /// Parse a callback identifier.
    pub fn parse(identifier: &str) -> Result<Self, ValidationError> {
        let button: ActionButton = identifier.parse()?;
        Self::from_button(&button)
    }

    pub fn from_button(button: &ActionButton) -> Result<Self, ValidationError> {
        let verb = button.verb.as_str();
        let target = button.target.as_deref();
        let unknown = || ValidationError::UnknownAction(button.to_string());
        let need_target = || {
            target.map(str::to_string).ok_or_else(|| ValidationError::MissingActionTarget {
                verb: verb.to_string(),
            })
        };

        match verb {
            "snooze_all" | "pause" | "resume" | "run_now" if target.is_some() => Err(unknown()),
            "snooze_all" => Ok(UserAction::SnoozeAll),
            "pause" => Ok(UserAction::Pause),
            "resume" => Ok(UserAction::Resume),
            "run_now" => Ok(UserAction::RunNow),
            "mark_handled" => Ok(UserAction::MarkHandled {
                conversation_id: need_target()?,
            }),
            _ => {
                if let Some(kind) = verb.strip_prefix("unsnooze_") {
                    let kind = kind.parse::<SourceKind>().map_err(|_| unknown())?;
                    Ok(UserAction::Unsnooze {
                        kind,
                        id: need_target()?,
                    })
                } else if let Some(kind) = verb.strip_prefix("snooze_") {
                    let kind = kind.parse::<SourceKind>().map_err(|_| unknown())?;
                    Ok(UserAction::Snooze {
                        kind,
                        id: need_target()?,
                    })
                } else {
                    Err(unknown())
                }
            }
        }
    }

    /// The email conversation this action names, if any.
    pub fn conversation(&self) -> Option<&str> {
        match self {
            UserAction::Snooze {
                kind: SourceKind::Email,
                id,
            }
            | UserAction::Unsnooze {
                kind: SourceKind::Email,
                id,
            } => Some(id),
            UserAction::MarkHandled { conversation_id } => Some(conversation_id),
            _ => None,
        }
    }
}

/// What applying an action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Snoozed {
        kind: SourceKind,
        id: String,
        until: DateTime<Utc>,
    },
    SnoozedAll {
        count: usize,
        until: Option<DateTime<Utc>>,
    },
    Unsnoozed {
        kind: SourceKind,
        id: String,
        existed: bool,
    },
    Handled {
        conversation_id: String,
    },
    Paused,
    Resumed,
    /// The action was handed to the orchestrator and produced a cycle.
    Ran {
        cycle_id: String,
        action_taken: String,
    },
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Snoozed { kind, id, until } => {
                write!(f, "Snoozed {kind} {id} until {}", until.format("%Y-%m-%d %H:%M UTC"))
            }
            ActionOutcome::SnoozedAll { count: 0, .. } => {
                f.write_str("Nothing to snooze: no decided cycle yet")
            }
            ActionOutcome::SnoozedAll { count, until } => match until {
                Some(until) => write!(
                    f,
                    "Snoozed {count} items until {}",
                    until.format("%Y-%m-%d %H:%M UTC")
                ),
                None => write!(f, "Snoozed {count} items"),
            },
            ActionOutcome::Unsnoozed { kind, id, existed } => {
                if *existed {
                    write!(f, "Unsnoozed {kind} {id}")
                } else {
                    write!(f, "{kind} {id} was not snoozed")
                }
            }
            ActionOutcome::Handled { conversation_id } => {
                write!(f, "Marked conversation {conversation_id} as handled")
            }
            ActionOutcome::Paused => f.write_str("Paused"),
            ActionOutcome::Resumed => f.write_str("Resumed"),
            ActionOutcome::Ran {
                cycle_id,
                action_taken,
            } => write!(f, "Cycle {cycle_id}: {action_taken}"),
        }
    }
}

/// Applies actions that only touch persisted state.
///
/// `run_now` needs a live orchestrator and is rejected here; see
/// `CycleOrchestrator::handle_action`.
pub struct ActionHandler<'a> {
    db: &'a Database,
    policy: SnoozePolicy,
}

impl<'a> ActionHandler<'a> {
    pub fn new(db: &'a Database, policy: SnoozePolicy) -> Self {
        Self { db, policy }
    }

    pub fn apply(&self, action: &UserAction, now: DateTime<Utc>) -> Result<ActionOutcome> {
        let store = SnoozeStore::new(self.db, self.policy);
        let outcome = match action {
            UserAction::Snooze { kind, id } => {
                let until = store.snooze_item(*kind, id, now)?;
                ActionOutcome::Snoozed {
                    kind: *kind,
                    id: id.clone(),
                    until,
                }
            }
            UserAction::SnoozeAll => match self.db.latest_decided_checkin()? {
                Some(checkin) if !checkin.items.is_empty() => {
                    let until = store.snooze_all(&checkin.items, now)?;
                    ActionOutcome::SnoozedAll {
                        count: checkin.items.len(),
                        until: Some(until),
                    }
                }
                _ => ActionOutcome::SnoozedAll {
                    count: 0,
                    until: None,
                },
            },
            UserAction::Unsnooze { kind, id } => ActionOutcome::Unsnoozed {
                kind: *kind,
                id: id.clone(),
                existed: store.unsnooze(*kind, id)?,
            },
            UserAction::MarkHandled { conversation_id } => {
                self.db.mark_handled(conversation_id, now)?;
                ActionOutcome::Handled {
                    conversation_id: conversation_id.clone(),
                }
            }
            UserAction::Pause => {
                self.db.set_paused(true)?;
                ActionOutcome::Paused
            }
            UserAction::Resume => {
                self.db.set_paused(false)?;
                ActionOutcome::Resumed
            }
            UserAction::RunNow => {
                return Err(ValidationError::InvalidValue {
                    field: "action".into(),
                    message: "run_now requires a running orchestrator".into(),
                }
                .into())
            }
        };
        info!(?action, "action applied");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ItemRef;
    use crate::storage::CheckinRecord;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_every_identifier_form() {
        assert_eq!(
            UserAction::parse("snooze_email:thread-1").unwrap(),
            UserAction::Snooze {
                kind: SourceKind::Email,
                id: "thread-1".into()
            }
        );
        assert_eq!(
            UserAction::parse("snooze_calendar:evt-2").unwrap(),
            UserAction::Snooze {
                kind: SourceKind::Calendar,
                id: "evt-2".into()
            }
        );
        assert_eq!(
            UserAction::parse("unsnooze_task:t-3").unwrap(),
            UserAction::Unsnooze {
                kind: SourceKind::Task,
                id: "t-3".into()
            }
        );
        assert_eq!(
            UserAction::parse("mark_handled:thread-4").unwrap(),
            UserAction::MarkHandled {
                conversation_id: "thread-4".into()
            }
        );
        assert_eq!(UserAction::parse("snooze_all").unwrap(), UserAction::SnoozeAll);
        assert_eq!(UserAction::parse("pause").unwrap(), UserAction::Pause);
        assert_eq!(UserAction::parse("resume").unwrap(), UserAction::Resume);
        assert_eq!(UserAction::parse("run_now").unwrap(), UserAction::RunNow);
    }

    #[test]
    fn rejects_unknown_and_incomplete_identifiers() {
        assert!(matches!(
            UserAction::parse("launch_rockets"),
            Err(ValidationError::UnknownAction(_))
        ));
        assert!(matches!(
            UserAction::parse("snooze_sms:1"),
            Err(ValidationError::UnknownAction(_))
        ));
        assert!(matches!(
            UserAction::parse("snooze_task"),
            Err(ValidationError::MissingActionTarget { .. })
        ));
        assert!(UserAction::parse("pause:now").is_err());
    }

    #[test]
    fn conversation_only_for_email_targets() {
        assert_eq!(
            UserAction::parse("snooze_email:thread-1")
                .unwrap()
                .conversation(),
            Some("thread-1")
        );
        assert_eq!(
            UserAction::parse("mark_handled:thread-2")
                .unwrap()
                .conversation(),
            Some("thread-2")
        );
        assert_eq!(
            UserAction::parse("snooze_task:t-1").unwrap().conversation(),
            None
        );
    }

    #[test]
    fn snooze_action_uses_item_duration() {
        let db = Database::open_memory().unwrap();
        let policy = SnoozePolicy {
            item: Duration::minutes(45),
            all: Duration::minutes(90),
        };
        let handler = ActionHandler::new(&db, policy);
        let outcome = handler
            .apply(&UserAction::parse("snooze_task:t-1").unwrap(), now())
            .unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Snoozed {
                kind: SourceKind::Task,
                id: "t-1".into(),
                until: now() + Duration::minutes(45),
            }
        );
        assert!(db.is_snoozed(SourceKind::Task, "t-1", now()).unwrap());
    }

    #[test]
    fn snooze_all_targets_latest_decided_cycle() {
        let db = Database::open_memory().unwrap();
        db.record_checkin(&CheckinRecord {
            cycle_id: "c1".into(),
            checked_at: now() - Duration::minutes(5),
            decision: "TEXT".into(),
            urgency: 5,
            summary: String::new(),
            reasoning: String::new(),
            sources_available: Vec::new(),
            sources_failed: Vec::new(),
            items: vec![
                ItemRef {
                    kind: SourceKind::Email,
                    id: "thread-1".into(),
                },
                ItemRef {
                    kind: SourceKind::Task,
                    id: "t-9".into(),
                },
            ],
            error: None,
        })
        .unwrap();

        let handler = ActionHandler::new(&db, SnoozePolicy::default());
        let outcome = handler.apply(&UserAction::SnoozeAll, now()).unwrap();
        assert!(matches!(outcome, ActionOutcome::SnoozedAll { count: 2, .. }));
        assert!(db.is_snoozed(SourceKind::Task, "t-9", now()).unwrap());
    }

    #[test]
    fn snooze_all_without_history_is_a_no_op() {
        let db = Database::open_memory().unwrap();
        let handler = ActionHandler::new(&db, SnoozePolicy::default());
        let outcome = handler.apply(&UserAction::SnoozeAll, now()).unwrap();
        assert_eq!(outcome.to_string(), "Nothing to snooze: no decided cycle yet");
    }

    #[test]
    fn mark_handled_and_pause_persist() {
        let db = Database::open_memory().unwrap();
        let handler = ActionHandler::new(&db, SnoozePolicy::default());
        handler
            .apply(&UserAction::parse("mark_handled:thread-1").unwrap(), now())
            .unwrap();
        let row = db.email_tracking("thread-1").unwrap().unwrap();
        assert!(row.reply_detected);
        assert_eq!(row.last_notified, Some(now()));

        handler.apply(&UserAction::Pause, now()).unwrap();
        assert!(db.is_paused().unwrap());
        handler.apply(&UserAction::Resume, now()).unwrap();
        assert!(!db.is_paused().unwrap());
    }

    #[test]
    fn run_now_is_rejected_without_orchestrator() {
        let db = Database::open_memory().unwrap();
        let handler = ActionHandler::new(&db, SnoozePolicy::default());
        assert!(handler.apply(&UserAction::RunNow, now()).is_err());
    }
}
