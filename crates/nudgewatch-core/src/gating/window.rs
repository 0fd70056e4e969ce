//! Wall-clock time-of-day values and windows that may wrap past midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const SECS_PER_DAY: u32 = 24 * 60 * 60;

/// A wall-clock `HH:MM` in the configured timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTimeOfDay(format!("{hour}:{minute}")));
        }
        Ok(Self {
            minutes: hour as u16 * 60 + minute as u16,
        })
    }

    /// Const constructor for literals; out-of-range parts wrap.
    pub(crate) const fn at(hour: u8, minute: u8) -> Self {
        Self {
            minutes: (hour as u16 % 24) * 60 + (minute as u16 % 60),
        }
    }

    pub fn hour(self) -> u8 {
        (self.minutes / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.minutes % 60) as u8
    }

    /// Minutes since local midnight.
    pub fn minutes_of_day(self) -> u32 {
        self.minutes as u32
    }

    pub(crate) fn secs_of_day(self) -> u32 {
        self.minutes as u32 * 60
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTimeOfDay(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// `[start, end)` in local wall-clock time.
///
/// When `start > end` the window wraps midnight. `start == end` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parse `"22:00-07:00"`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let (start, end) = raw
            .split_once('-')
            .ok_or_else(|| ValidationError::InvalidTimeOfDay(raw.to_string()))?;
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether `time` falls inside the window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let now = time.num_seconds_from_midnight() % SECS_PER_DAY;
        let start = self.start.secs_of_day();
        let end = self.end.secs_of_day();
        if start <= end {
            start <= now && now < end
        } else {
            now >= start || now < end
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Whether `time` lies in `[at - lead_minutes, at]`, wrapping midnight.
pub(crate) fn within_lead(time: NaiveTime, at: TimeOfDay, lead_minutes: u32) -> bool {
    let now = time.num_seconds_from_midnight() % SECS_PER_DAY;
    let until = (at.secs_of_day() + SECS_PER_DAY - now) % SECS_PER_DAY;
    let lead = lead_minutes.min(24 * 60 - 1) * 60;
    until <= lead
}
