//! Cycle orchestration.
//!
//! One cycle runs the fixed pipeline:
//!
//! 1. pause check and single-flight guard
//! 2. gating (skipped when bypassed)
//! 3. concurrent source fetch, settle-all
//! 4. best-effort enrichment and email tracking
//! 5. snooze expiry sweep and snoozed-item filtering
//! 6. reasoning call, validation, weekend downgrade
//! 7. exactly one notification
//! 8. check-in row and last-cycle pointer
//!
//! [`CycleOrchestrator::run_cycle`] never fails outward. Every failure ends
//! up described in the returned [`CycleResult`].

mod clock;
mod types;


pub use clock::{Clock, ManualClock, SystemClock};
pub use types::{new_cycle_id, CycleResult, OrchestratorStatus};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::actions::{ActionHandler, ActionOutcome, UserAction};
use crate::decision::{resolve, Decision, DecisionClient, DecisionContext, DecisionKind};
use crate::error::{DatabaseError, NotifyError, Result};
use crate::gating::{GatingEngine, GatingResult};
use crate::notify::Notifier;
use crate::snooze::{SnoozePolicy, SnoozeStore};
use crate::sources::{collect_all, Enricher, Source, SourceItem, SourceKind};
use crate::storage::{CheckinRecord, Config, Database, HistoryConfig};

pub const REASON_PAUSED: &str = "paused by user";
pub const REASON_ALREADY_RUNNING: &str = "previous cycle still running";

/// The external collaborators a cycle drives.
pub struct Collaborators {
    pub sources: Vec<Arc<dyn Source>>,
    pub enricher: Arc<dyn Enricher>,
    pub decision: Arc<dyn DecisionClient>,
    pub notifier: Arc<dyn Notifier>,
}

/// Clears the running flag when the cycle ends, however it ends.
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs cycles for a single user.
pub struct CycleOrchestrator {
    gating: GatingEngine,
    snooze: SnoozePolicy,
    history_cfg: HistoryConfig,
    db: Arc<Database>,
    sources: Vec<Arc<dyn Source>>,
    enricher: Arc<dyn Enricher>,
    decision: Arc<dyn DecisionClient>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    paused: AtomicBool,
    running: AtomicBool,
    history: Mutex<VecDeque<CycleResult>>,
}

impl CycleOrchestrator {
    /// Build an orchestrator. The pause flag is restored from the database.
    ///
    /// The persisted flag stays authoritative: every cycle re-reads it, so a
    /// pause written by another process (the CLI) takes effect on the next tick.
    pub fn new(config: &Config, db: Arc<Database>, collaborators: Collaborators) -> Self {
        let paused = db.is_paused().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read pause flag, starting unpaused");
            false
        });
        Self {
            gating: GatingEngine::new(config.gating.clone()),
            snooze: SnoozePolicy::from(&config.snooze),
            history_cfg: config.history.clone(),
            db,
            sources: collaborators.sources,
            enricher: collaborators.enricher,
            decision: collaborators.decision,
            notifier: collaborators.notifier,
            clock: Arc::new(SystemClock),
            paused: AtomicBool::new(paused),
            running: AtomicBool::new(false),
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Re-read the persisted pause flag, keeping the last known value if the read fails.
    fn refresh_paused(&self) -> bool {
        match self.db.is_paused() {
            Ok(paused) => {
                self.paused.store(paused, Ordering::Release);
                paused
            }
            Err(e) => {
                warn!(error = %e, "failed to read pause flag, using last known value");
                self.is_paused()
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Set the pause flag and persist it.
    ///
    /// The in-memory flag changes even when persisting fails.
    pub fn set_paused(&self, paused: bool) -> Result<(), DatabaseError> {
        self.paused.store(paused, Ordering::Release);
        info!(paused, "pause flag changed");
        self.db.set_paused(paused)
    }

    /// Manual trigger: a cycle that skips gating, through the same guard.
    pub async fn run_now(&self) -> CycleResult {
        self.run_cycle(true).await
    }

    /// Run one cycle.
    pub async fn run_cycle(&self, bypass_gating: bool) -> CycleResult {
        let started_at = self.clock.now();
        let cycle_id = new_cycle_id(started_at);

        if self.refresh_paused() {
            return self.blocked(cycle_id, started_at, REASON_PAUSED);
        }

        let Some(_guard) = RunningGuard::acquire(&self.running) else {
            debug!(%cycle_id, "overlapping cycle dropped");
            return self.blocked(cycle_id, started_at, REASON_ALREADY_RUNNING);
        };

        info!(%cycle_id, bypass_gating, "cycle started");

        if !bypass_gating {
            if let GatingResult::Blocked { reason } = self.gating.evaluate(started_at, &*self.db) {
                return self.blocked(cycle_id, started_at, &reason);
            }
        }

        let result = self.execute(cycle_id, started_at, bypass_gating).await;
        info!(
            cycle_id = %result.cycle_id,
            errored = result.errored,
            action = %result.action_taken,
            "cycle finished"
        );
        self.remember(result.clone());
        result
    }

    /// Paused flag, running flag, last-cycle pointer and the latest result.
    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            paused: self.refresh_paused(),
            running: self.is_running(),
            last_cycle_at: self
                .db
                .get_last_cycle_at()
                .unwrap_or_else(|e| {
                    warn!(error = %e, "failed to read last cycle timestamp");
                    None
                }),
            last_result: self.lock_history().back().cloned(),
        }
    }

    /// In-memory cycle results, newest first.
    pub fn history(&self, limit: usize) -> Vec<CycleResult> {
        self.lock_history().iter().rev().take(limit).cloned().collect()
    }

    /// Apply a button callback.
    pub async fn handle_action(&self, action: UserAction) -> Result<ActionOutcome> {
        match action {
            UserAction::Pause => {
                self.set_paused(true)?;
                Ok(ActionOutcome::Paused)
            }
            UserAction::Resume => {
                self.set_paused(false)?;
                Ok(ActionOutcome::Resumed)
            }
            UserAction::RunNow => {
                let result = self.run_now().await;
                Ok(ActionOutcome::Ran {
                    cycle_id: result.cycle_id,
                    action_taken: result.action_taken,
                })
            }
            other => ActionHandler::new(&self.db, self.snooze).apply(&other, self.clock.now()),
        }
    }

    fn blocked(&self, cycle_id: String, started_at: DateTime<Utc>, reason: &str) -> CycleResult {
        info!(%cycle_id, %reason, "cycle blocked");
        let result = CycleResult::blocked(cycle_id, started_at, self.clock.now(), reason);
        self.remember(result.clone());
        result
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, VecDeque<CycleResult>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remember(&self, result: CycleResult) {
        let cap = self.history_cfg.in_memory_cycles.max(1) as usize;
        let mut history = self.lock_history();
        history.push_back(result);
        while history.len() > cap {
            history.pop_front();
        }
    }

    async fn execute(
        &self,
        cycle_id: String,
        started_at: DateTime<Utc>,
        bypassed: bool,
    ) -> CycleResult {
        // Collect
        let collected = collect_all(&self.sources).await;
        let sources_available = collected.available_sources();
        let sources_failed = collected.failed_sources();
        let statuses = collected.statuses;
        let failures = collected.failures;

        // Enrich
        let items = self.enricher.enrich(collected.items).await;
        let now = self.clock.now();
        let mut items = self.track_emails(items, now);

        // Snoozes
        let store = SnoozeStore::new(&self.db, self.snooze);
        match store.purge(now) {
            Ok(0) => {}
            Ok(n) => debug!(%cycle_id, purged = n, "expired snoozes removed"),
            Err(e) => warn!(%cycle_id, error = %e, "snooze purge failed"),
        }
        let snoozed_filtered = store.filter_active(&mut items, now).unwrap_or_else(|e| {
            warn!(%cycle_id, error = %e, "snooze lookup failed, keeping all items");
            0
        });

        // Decide
        let recent_checkins = self
            .db
            .recent_checkins(self.history_cfg.recent_cycles_for_context as usize)
            .unwrap_or_else(|e| {
                warn!(%cycle_id, error = %e, "failed to load recent check-ins");
                Vec::new()
            });
        let (messages, events, tasks) = DecisionContext::bucket(items);
        let gating_cfg = self.gating.config();
        let context = DecisionContext {
            cycle_id: cycle_id.clone(),
            generated_at: now,
            local_time: gating_cfg.local_time(now).format("%Y-%m-%d %H:%M").to_string(),
            weekend: gating_cfg.is_weekend(now),
            messages,
            events,
            tasks,
            sources: statuses,
            failures,
            recent_checkins,
            snoozed_filtered,
        };

        let decision = resolve(self.decision.decide(&context).await);
        if decision.is_fallback() {
            warn!(%cycle_id, urgency = decision.urgency, "using fallback decision");
        }
        let (decision, suppressed) = self.apply_weekend_mode(decision, now);

        // Notify
        let delivery = self.deliver(&cycle_id, &decision).await;
        let finished_at = self.clock.now();

        let (action_taken, error) = match &delivery {
            Ok(()) => {
                self.stamp_notified(&decision, finished_at);
                (describe(&decision, suppressed), None)
            }
            Err(err) => {
                warn!(%cycle_id, error = %err, "notification failed");
                let notice = format!("nudgewatch cycle {cycle_id} failed: {err}");
                if let Err(e) = self.notifier.notify_plain_text(&notice).await {
                    warn!(%cycle_id, error = %e, "error notice also failed");
                }
                (format!("error: {err}"), Some(err.to_string()))
            }
        };
        let errored = error.is_some();

        // Record
        let record = CheckinRecord {
            cycle_id: cycle_id.clone(),
            checked_at: finished_at,
            decision: decision.kind.as_str().to_string(),
            urgency: decision.urgency,
            summary: decision.summary.clone(),
            reasoning: decision.reasoning.clone(),
            sources_available,
            sources_failed,
            items: context.item_refs(),
            error,
        };
        self.persist(&record, errored, finished_at);

        CycleResult {
            cycle_id,
            started_at,
            finished_at,
            gating: GatingResult::Proceed,
            bypassed_gating: bypassed,
            context: Some(context),
            decision: Some(decision),
            action_taken,
            errored,
        }
    }

    /// Record conversations in the tracking table and mark already-notified threads.
    fn track_emails(&self, mut items: Vec<SourceItem>, now: DateTime<Utc>) -> Vec<SourceItem> {
        for item in items.iter_mut().filter(|i| i.kind == SourceKind::Email) {
            let conversation = item.snooze_key().to_string();
            if let Err(e) = self.db.observe_conversation(&conversation, now) {
                warn!(conversation = %conversation, error = %e, "email tracking failed");
                continue;
            }
            if item.annotations.reply_detected {
                if let Err(e) = self.db.mark_reply_detected(&conversation, now) {
                    warn!(conversation = %conversation, error = %e, "email tracking failed");
                }
            }
            match self.db.email_tracking(&conversation) {
                Ok(Some(row)) => {
                    item.annotations.already_notified |= row.last_notified.is_some();
                    item.annotations.reply_detected |= row.reply_detected;
                }
                Ok(None) => {}
                Err(e) => warn!(conversation = %conversation, error = %e, "email tracking failed"),
            }
        }
        items
    }

    /// Downgrade low-urgency weekend interruptions in `reduced` mode.
    fn apply_weekend_mode(&self, decision: Decision, now: DateTime<Utc>) -> (Decision, bool) {
        if !decision.kind.interrupts()
            || !self.gating.config().suppresses_weekend_urgency(now, decision.urgency)
        {
            return (decision, false);
        }
        let threshold = self.gating.config().weekend_urgency_threshold;
        info!(
            original = %decision.kind,
            urgency = decision.urgency,
            threshold,
            "weekend reduced mode downgraded decision"
        );
        let note = format!(
            "[weekend reduced mode: {} at urgency {} is below threshold {}, delivered silently]",
            decision.kind, decision.urgency, threshold
        );
        let downgraded = Decision {
            kind: DecisionKind::None,
            reasoning: format!("{}\n\n{note}", decision.reasoning),
            ..decision
        };
        (downgraded, true)
    }

    /// Exactly one notification. Only a primary failure is returned.
    async fn deliver(&self, cycle_id: &str, decision: &Decision) -> Result<(), NotifyError> {
        match &decision.kind {
            DecisionKind::None => {
                if let Err(e) = self.notifier.notify_silently(decision).await {
                    warn!(%cycle_id, error = %e, "silent notification failed");
                }
                Ok(())
            }
            DecisionKind::Text => self.notifier.notify(decision).await,
            DecisionKind::Call { spoken_briefing } => {
                info!(
                    %cycle_id,
                    has_briefing = spoken_briefing.is_some(),
                    "voice call delivery not available, sending as notification"
                );
                self.notifier.notify(decision).await
            }
        }
    }

    /// Conversations named by buttons of a delivered interruption.
    fn stamp_notified(&self, decision: &Decision, at: DateTime<Utc>) {
        if !decision.kind.interrupts() {
            return;
        }
        for button in &decision.action_buttons {
            let Ok(action) = UserAction::from_button(button) else {
                continue;
            };
            if let Some(conversation) = action.conversation() {
                if let Err(e) = self.db.mark_notified(conversation, at) {
                    warn!(conversation, error = %e, "failed to stamp last_notified");
                }
            }
        }
    }

    fn persist(&self, record: &CheckinRecord, errored: bool, finished_at: DateTime<Utc>) {
        if let Err(e) = self.db.record_checkin(record) {
            warn!(cycle_id = %record.cycle_id, error = %e, "failed to record check-in");
        }
        if let Err(e) = self
            .db
            .trim_checkins(self.history_cfg.max_checkins_retained as usize)
        {
            warn!(error = %e, "failed to trim check-in log");
        }
        if errored {
            return;
        }
        if let Err(e) = self.db.set_last_cycle_at(finished_at) {
            warn!(cycle_id = %record.cycle_id, error = %e, "failed to advance last cycle pointer");
        }
    }
}

fn describe(decision: &Decision, suppressed: bool) -> String {
    match (&decision.kind, suppressed) {
        (DecisionKind::None, true) => format!(
            "sent silently: weekend downgrade at urgency {}",
            decision.urgency
        ),
        (DecisionKind::None, false) if decision.is_fallback() => {
            "sent silently: fallback decision".to_string()
        }
        (DecisionKind::None, false) => "sent silently: NONE".to_string(),
        (DecisionKind::Text, _) => format!("notified: TEXT (urgency {})", decision.urgency),
        (DecisionKind::Call { .. }, _) => format!(
            "notified: CALL (urgency {}), voice call stubbed",
            decision.urgency
        ),
    }
}
