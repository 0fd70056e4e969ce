use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, DecisionContext};
use crate::gating::GatingResult;

/// Outcome of one orchestrator cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    /// `YYYYMMDDHHMMSS-<6 hex>` from the start time.
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `Proceed` when gating passed or was bypassed.
    pub gating: GatingResult,
    #[serde(default)]
    pub bypassed_gating: bool,
    #[serde(default)]
    pub context: Option<DecisionContext>,
    #[serde(default)]
    pub decision: Option<Decision>,
    /// Human-readable description of what happened.
    pub action_taken: String,
    #[serde(default)]
    pub errored: bool,
}

impl CycleResult {
    pub(crate) fn blocked(
        cycle_id: String,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        reason: &str,
    ) -> Self {
        Self {
            cycle_id,
            started_at,
            finished_at,
            gating: GatingResult::blocked(reason),
            bypassed_gating: false,
            context: None,
            decision: None,
            action_taken: format!("blocked: {reason}"),
            errored: false,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.gating.is_blocked()
    }

    pub fn blocked_reason(&self) -> Option<&str> {
        self.gating.reason()
    }
}

/// Snapshot returned by `CycleOrchestrator::status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub paused: bool,
    pub running: bool,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_result: Option<CycleResult>,
}

/// Fresh cycle id for a cycle started at `started_at`.
pub fn new_cycle_id(started_at: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
    format!("{}-{suffix:06x}", started_at.format("%Y%m%d%H%M%S"))
}
