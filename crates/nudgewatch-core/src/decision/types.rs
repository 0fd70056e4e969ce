use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Urgency reported by the fallback decision: "the engine never ran".
pub const FALLBACK_URGENCY: u8 = 0;
pub const MIN_URGENCY: u8 = 1;
pub const MAX_URGENCY: u8 = 10;

/// What the reasoning step wants done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "UPPERCASE")]
pub enum DecisionKind {
    /// Do not interrupt. Still delivered silently so the reasoning is auditable.
    None,
    /// Interrupt with a text notification.
    Text,
    /// Interrupt with a call. Voice delivery is not wired; the briefing rides along.
    Call {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spoken_briefing: Option<String>,
    },
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::None => "NONE",
            DecisionKind::Text => "TEXT",
            DecisionKind::Call { .. } => "CALL",
        }
    }

    /// TEXT and CALL interrupt the user; NONE does not.
    pub fn interrupts(&self) -> bool {
        match self {
            DecisionKind::None => false,
            DecisionKind::Text | DecisionKind::Call { .. } => true,
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A follow-up button: a bare verb (`snooze_all`) or a `verb:id` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionButton {
    pub verb: String,
    pub target: Option<String>,
}

impl ActionButton {
    pub fn verb(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            target: None,
        }
    }

    pub fn with_target(verb: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            target: Some(target.into()),
        }
    }
}

impl FromStr for ActionButton {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, target) = match s.split_once(':') {
            Some((verb, target)) => (verb.trim(), Some(target.trim())),
            None => (s, None),
        };
        if verb.is_empty() || verb.contains(char::is_whitespace) {
            return Err(ValidationError::UnknownAction(s.to_string()));
        }
        match target {
            Some("") => Err(ValidationError::MissingActionTarget {
                verb: verb.to_string(),
            }),
            Some(target) => Ok(ActionButton::with_target(verb, target)),
            None => Ok(ActionButton::verb(verb)),
        }
    }
}

impl TryFrom<String> for ActionButton {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActionButton> for String {
    fn from(value: ActionButton) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ActionButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}:{}", self.verb, target),
            None => f.write_str(&self.verb),
        }
    }
}

/// A validated decision. Urgency is always in `[1, 10]`, or 0 for the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(flatten)]
    pub kind: DecisionKind,
    pub urgency: u8,
    pub summary: String,
    pub reasoning: String,
    #[serde(default)]
    pub action_buttons: Vec<ActionButton>,
}

impl Decision {
    /// The deterministic NONE substituted when the reasoning call fails.
    pub fn fallback(cause: impl fmt::Display) -> Self {
        Self {
            kind: DecisionKind::None,
            urgency: FALLBACK_URGENCY,
            summary: format!("Decision engine unavailable: {cause}"),
            reasoning: format!("Fallback decision, reasoning step failed: {cause}"),
            action_buttons: Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.urgency == FALLBACK_URGENCY
    }

    pub fn spoken_briefing(&self) -> Option<&str> {
        match &self.kind {
            DecisionKind::Call { spoken_briefing } => spoken_briefing.as_deref(),
            DecisionKind::None | DecisionKind::Text => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_button_parses_verb_and_pair() {
        let bare: ActionButton = "snooze_all".parse().unwrap();
        assert_eq!(bare, ActionButton::verb("snooze_all"));

        let pair: ActionButton = "snooze_email:thread-42".parse().unwrap();
        assert_eq!(pair.verb, "snooze_email");
        assert_eq!(pair.target.as_deref(), Some("thread-42"));
        assert_eq!(pair.to_string(), "snooze_email:thread-42");
    }

    #[test]
    fn action_button_rejects_blank_parts() {
        assert!("".parse::<ActionButton>().is_err());
        assert!(":id".parse::<ActionButton>().is_err());
        assert!("snooze_task:".parse::<ActionButton>().is_err());
        assert!("two words".parse::<ActionButton>().is_err());
    }

    #[test]
    fn decision_serializes_kind_inline() {
        let decision = Decision {
            kind: DecisionKind::Call {
                spoken_briefing: Some("Your flight moved".into()),
            },
            urgency: 9,
            summary: "Flight change".into(),
            reasoning: "Gate changed an hour before boarding".into(),
            action_buttons: vec![ActionButton::verb("snooze_all")],
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "CALL");
        assert_eq!(json["spoken_briefing"], "Your flight moved");
        assert_eq!(json["action_buttons"][0], "snooze_all");

        let back: Decision = serde_json::from_value(json).unwrap();
        assert_eq!(back, decision);
    }

    #[test]
    fn fallback_names_the_cause() {
        let decision = Decision::fallback("timed out");
        assert_eq!(decision.kind, DecisionKind::None);
        assert_eq!(decision.urgency, 0);
        assert!(decision.is_fallback());
        assert!(decision.reasoning.contains("timed out"));
        assert!(decision.summary.contains("timed out"));
        assert!(decision.action_buttons.is_empty());
    }
}
