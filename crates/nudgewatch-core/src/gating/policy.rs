//! Static gating policy, loaded once from the `[gating]` config section.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::window::{TimeOfDay, TimeWindow};
use crate::error::ConfigError;

/// How weekends are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekendMode {
    /// No cycles reach the reasoning step on Saturday/Sunday.
    Quiet,
    /// Cycles run, but low-urgency interruptions are downgraded after deciding.
    #[default]
    Reduced,
    /// Weekends behave like weekdays.
    Normal,
}

impl fmt::Display for WeekendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeekendMode::Quiet => "quiet",
            WeekendMode::Reduced => "reduced",
            WeekendMode::Normal => "normal",
        })
    }
}

/// A recurring fixed time the user must leave for (school pickup and the like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupTime {
    pub at: TimeOfDay,
    /// Only applies Monday through Friday.
    #[serde(default)]
    pub weekdays_only: bool,
}

/// Pickup windows share one reminder lead time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupConfig {
    #[serde(default)]
    pub times: Vec<PickupTime>,
    #[serde(default = "default_reminder_minutes")]
    pub reminder_minutes: u32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            times: Vec::new(),
            reminder_minutes: default_reminder_minutes(),
        }
    }
}

/// Gating policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatingConfig {
    /// Minimum minutes between completed cycles.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,
    #[serde(default = "default_quiet_hours")]
    pub quiet_hours: Option<TimeWindow>,
    #[serde(default)]
    pub focus_hours: Option<TimeWindow>,
    #[serde(default)]
    pub weekend_mode: WeekendMode,
    /// In `reduced` weekend mode, interruptions below this urgency are downgraded.
    #[serde(default = "default_weekend_urgency_threshold")]
    pub weekend_urgency_threshold: u8,
    #[serde(default)]
    pub pickup: PickupConfig,
    /// Fixed offset from UTC for wall-clock rules. `None` uses the host's local zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_cooldown_minutes() -> u32 {
    120
}
fn default_quiet_hours() -> Option<TimeWindow> {
    Some(TimeWindow::new(TimeOfDay::at(22, 0), TimeOfDay::at(7, 0)))
}
fn default_weekend_urgency_threshold() -> u8 {
    7
}
fn default_reminder_minutes() -> u32 {
    30
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: default_cooldown_minutes(),
            quiet_hours: default_quiet_hours(),
            focus_hours: None,
            weekend_mode: WeekendMode::default(),
            weekend_urgency_threshold: default_weekend_urgency_threshold(),
            pickup: PickupConfig::default(),
            utc_offset_minutes: None,
        }
    }
}

impl GatingConfig {
    fn fixed_offset(minutes: i32) -> Option<FixedOffset> {
        minutes.checked_mul(60).and_then(FixedOffset::east_opt)
    }

    /// Wall-clock time in the configured zone.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self.utc_offset_minutes.and_then(Self::fixed_offset) {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.with_timezone(&Local).naive_local(),
        }
    }

    /// Saturday or Sunday in the configured zone.
    pub fn is_weekend(&self, now: DateTime<Utc>) -> bool {
        matches!(self.local_time(now).weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Whether a decision of `urgency` should be downgraded at `now`.
    pub fn suppresses_weekend_urgency(&self, now: DateTime<Utc>, urgency: u8) -> bool {
        self.weekend_mode == WeekendMode::Reduced
            && self.is_weekend(now)
            && urgency < self.weekend_urgency_threshold
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(minutes) = self.utc_offset_minutes {
            if Self::fixed_offset(minutes).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "gating.utc_offset_minutes".into(),
                    message: format!("{minutes} is not a valid UTC offset"),
                });
            }
        }
        if !(1..=10).contains(&self.weekend_urgency_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "gating.weekend_urgency_threshold".into(),
                message: "must be between 1 and 10".into(),
            });
        }
        if self.pickup.reminder_minutes >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                key: "gating.pickup.reminder_minutes".into(),
                message: "must be shorter than a day".into(),
            });
        }
        Ok(())
    }
}
