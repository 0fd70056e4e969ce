//! # nudgewatch core library
//!
//! Decides, on every scheduled tick, whether to interrupt the user about
//! their mail, calendar and tasks, and what to do with the answer. The CLI
//! binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Gating**: a pure policy check (focus/quiet hours, weekend mode,
//!   pickup windows, cooldown) run before any external call
//! - **Orchestrator**: the fixed per-tick pipeline, single-flight and never
//!   failing outward
//! - **Decision**: the structured reasoning contract with validation,
//!   clamping and a deterministic fallback
//! - **Snooze**: per-item re-notification suppression with lazy expiry
//! - **Storage**: SQLite state and TOML configuration
//!
//! Mail, calendar and task fetchers, the reasoning service and the chat
//! transport are external collaborators behind async traits.
//!
//! ## Key Components
//!
//! - [`GatingEngine`]: time-window and cooldown policy
//! - [`CycleOrchestrator`]: pipeline sequencing
//! - [`Database`]: persisted state
//! - [`Config`]: application configuration management

pub mod actions;
pub mod decision;
pub mod error;
pub mod gating;
pub mod notify;
pub mod orchestrator;
pub mod scheduler;
pub mod snooze;
pub mod sources;
pub mod storage;

pub use actions::{ActionHandler, ActionOutcome, UserAction};
pub use decision::{ActionButton, Decision, DecisionClient, DecisionContext, DecisionKind, RawDecision};
pub use error::{
    ConfigError, CoreError, DatabaseError, DecisionError, NotifyError, SourceError, ValidationError,
};
pub use gating::{GatingConfig, GatingEngine, GatingResult, TimeOfDay, TimeWindow, WeekendMode};
pub use notify::Notifier;
pub use orchestrator::{Clock, Collaborators, CycleOrchestrator, CycleResult, OrchestratorStatus};
pub use snooze::{SnoozePolicy, SnoozeState, SnoozeStore};
pub use sources::{Enricher, ItemRef, Source, SourceItem, SourceKind};
pub use storage::{CheckinRecord, Config, Database};
