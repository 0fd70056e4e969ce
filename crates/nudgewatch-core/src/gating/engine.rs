//! Gating engine: decides whether a cycle may reach the reasoning step.
//!
//! Rules are checked in a fixed precedence and the first one that blocks
//! wins:
//!
//! 1. focus hours
//! 2. quiet hours
//! 3. weekend quiet mode
//! 4. pickup reminder windows
//! 5. cooldown since the last completed cycle
//!
//! The engine never writes state. The only persisted value it reads is the
//! timestamp of the last completed cycle, and only when rules 1-4 pass.

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::policy::{GatingConfig, WeekendMode};
use super::window::within_lead;

/// Outcome of a gating evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GatingResult {
    Proceed,
    Blocked { reason: String },
}

impl GatingResult {
    pub fn blocked(reason: impl Into<String>) -> Self {
        GatingResult::Blocked {
            reason: reason.into(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, GatingResult::Blocked { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            GatingResult::Proceed => None,
            GatingResult::Blocked { reason } => Some(reason),
        }
    }
}

/// Read access to the "last completed cycle" pointer.
pub trait LastCycleSource {
    fn last_cycle_at(&self) -> Option<DateTime<Utc>>;
}

impl LastCycleSource for Option<DateTime<Utc>> {
    fn last_cycle_at(&self) -> Option<DateTime<Utc>> {
        *self
    }
}

/// Evaluates [`GatingConfig`] against the current time.
#[derive(Debug, Clone, Default)]
pub struct GatingEngine {
    config: GatingConfig,
}

impl GatingEngine {
    pub fn new(config: GatingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GatingConfig {
        &self.config
    }

    /// Evaluate all rules at `now`.
    pub fn evaluate<S>(&self, now: DateTime<Utc>, last_cycle: &S) -> GatingResult
    where
        S: LastCycleSource + ?Sized,
    {
        let result = self.evaluate_inner(now, last_cycle);
        if let GatingResult::Blocked { reason } = &result {
            debug!(%reason, "gating blocked");
        }
        result
    }

    fn evaluate_inner<S>(&self, now: DateTime<Utc>, last_cycle: &S) -> GatingResult
    where
        S: LastCycleSource + ?Sized,
    {
        let cfg = &self.config;
        let local = cfg.local_time(now);
        let time = local.time();

        if let Some(focus) = cfg.focus_hours {
            if focus.contains(time) {
                return GatingResult::blocked(format!("focus hours ({focus})"));
            }
        }

        if let Some(quiet) = cfg.quiet_hours {
            if quiet.contains(time) {
                return GatingResult::blocked(format!("quiet hours ({quiet})"));
            }
        }

        let weekend = matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
        if weekend && cfg.weekend_mode == WeekendMode::Quiet {
            return GatingResult::blocked("weekend quiet mode");
        }

        for pickup in &cfg.pickup.times {
            if pickup.weekdays_only && weekend {
                continue;
            }
            if within_lead(time, pickup.at, cfg.pickup.reminder_minutes) {
                return GatingResult::blocked(format!(
                    "pickup window ({}, reminder {} min)",
                    pickup.at, cfg.pickup.reminder_minutes
                ));
            }
        }

        if cfg.cooldown_minutes > 0 {
            if let Some(last) = last_cycle.last_cycle_at() {
                let elapsed = (now - last).num_minutes().max(0);
                if elapsed < i64::from(cfg.cooldown_minutes) {
                    return GatingResult::blocked(format!(
                        "cooldown: {elapsed} of {} minutes elapsed",
                        cfg.cooldown_minutes
                    ));
                }
            }
        }

        GatingResult::Proceed
    }
}
