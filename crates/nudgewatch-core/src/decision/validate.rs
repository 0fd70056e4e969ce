//! Validation of raw reasoning output into a [`Decision`].
//!
//! Anything the reasoning step returns passes through [`validate`]. Missing
//! fields, unknown kinds and non-finite urgency never surface as errors: they
//! collapse into [`Decision::fallback`] so the cycle always completes.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::types::{ActionButton, Decision, DecisionKind, MAX_URGENCY, MIN_URGENCY};
use crate::error::DecisionError;

/// Unvalidated reasoning output. Every field is optional on purpose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDecision {
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub urgency: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default, alias = "actionButtons")]
    pub action_buttons: Option<Vec<String>>,
    #[serde(default, alias = "spokenBriefing")]
    pub spoken_briefing: Option<String>,
}

impl RawDecision {
    /// Parse the reasoning step's JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, DecisionError> {
        serde_json::from_str(payload).map_err(|e| DecisionError::Malformed(e.to_string()))
    }
}

/// Round to the nearest integer and clamp into `[1, 10]`.
///
/// Returns `None` for NaN and infinities.
pub fn clamp_urgency(urgency: f64) -> Option<u8> {
    if !urgency.is_finite() {
        return None;
    }
    let rounded = urgency.round().clamp(f64::from(MIN_URGENCY), f64::from(MAX_URGENCY));
    Some(rounded as u8)
}

/// Turn raw output into a usable decision, substituting the fallback on any
/// structural problem.
pub fn validate(raw: RawDecision) -> Decision {
    match try_validate(raw) {
        Ok(decision) => decision,
        Err(err) => {
            warn!(error = %err, "discarding reasoning output");
            Decision::fallback(err)
        }
    }
}

/// Apply [`validate`] to a reasoning call, or fall back when the call failed.
pub fn resolve(outcome: Result<RawDecision, DecisionError>) -> Decision {
    match outcome {
        Ok(raw) => validate(raw),
        Err(err) => {
            warn!(error = %err, "reasoning call failed, using fallback decision");
            Decision::fallback(err)
        }
    }
}

fn try_validate(raw: RawDecision) -> Result<Decision, DecisionError> {
    let kind = raw.decision.ok_or(DecisionError::MissingField("decision"))?;
    let urgency = raw.urgency.ok_or(DecisionError::MissingField("urgency"))?;
    let summary = raw.summary.ok_or(DecisionError::MissingField("summary"))?;
    let reasoning = raw.reasoning.ok_or(DecisionError::MissingField("reasoning"))?;

    let urgency = clamp_urgency(urgency)
        .ok_or_else(|| DecisionError::Malformed(format!("urgency {urgency} is not a number")))?;

    let kind = match kind.as_str() {
        "NONE" => DecisionKind::None,
        "TEXT" => DecisionKind::Text,
        "CALL" => DecisionKind::Call {
            spoken_briefing: raw
                .spoken_briefing
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        },
        other => {
            return Err(DecisionError::Malformed(format!(
                "unrecognized decision '{other}'"
            )))
        }
    };

    let action_buttons = raw
        .action_buttons
        .unwrap_or_default()
        .iter()
        .filter(|id| !id.trim().is_empty())
        .filter_map(|id| match id.parse::<ActionButton>() {
            Ok(button) => Some(button),
            Err(err) => {
                warn!(button = %id, error = %err, "dropping action button");
                None
            }
        })
        .collect();

    Ok(Decision {
        kind,
        urgency,
        summary,
        reasoning,
        action_buttons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(kind: &str, urgency: f64) -> RawDecision {
        RawDecision {
            decision: Some(kind.into()),
            urgency: Some(urgency),
            summary: Some("Two unread threads from your manager".into()),
            reasoning: Some("Both mention today's deadline".into()),
            ..RawDecision::default()
        }
    }

    #[test]
    fn well_formed_text_passes_through() {
        let mut input = raw("TEXT", 6.0);
        input.action_buttons = Some(vec!["snooze_email:t-1".into(), "snooze_all".into()]);
        let decision = validate(input);
        assert_eq!(decision.kind, DecisionKind::Text);
        assert_eq!(decision.urgency, 6);
        assert_eq!(decision.action_buttons.len(), 2);
        assert_eq!(decision.action_buttons[1], ActionButton::verb("snooze_all"));
    }

    #[test]
    fn unknown_kind_and_out_of_range_urgency_fall_back() {
        let decision = validate(raw("MAYBE", 15.0));
        assert_eq!(decision.kind, DecisionKind::None);
        assert_eq!(decision.urgency, 0);
        assert!(decision.reasoning.contains("MAYBE"));
        assert!(decision.action_buttons.is_empty());
    }

    #[test]
    fn lowercase_kind_is_not_accepted() {
        assert!(validate(raw("text", 5.0)).is_fallback());
    }

    #[test]
    fn urgency_is_rounded_then_clamped() {
        assert_eq!(validate(raw("TEXT", 15.0)).urgency, 10);
        assert_eq!(validate(raw("TEXT", -3.0)).urgency, 1);
        assert_eq!(validate(raw("TEXT", 0.4)).urgency, 1);
        assert_eq!(validate(raw("TEXT", 6.5)).urgency, 7);
        assert_eq!(validate(raw("TEXT", 6.49)).urgency, 6);
    }

    #[test]
    fn non_finite_urgency_falls_back() {
        assert!(validate(raw("TEXT", f64::NAN)).is_fallback());
        assert!(validate(raw("CALL", f64::INFINITY)).is_fallback());
    }

    #[test]
    fn missing_required_field_falls_back() {
        let mut input = raw("TEXT", 5.0);
        input.reasoning = None;
        let decision = validate(input);
        assert!(decision.is_fallback());
        assert!(decision.reasoning.contains("reasoning"));
    }

    #[test]
    fn blank_buttons_are_dropped() {
        let mut input = raw("TEXT", 5.0);
        input.action_buttons = Some(vec!["".into(), "   ".into(), "snooze_task:42".into()]);
        let decision = validate(input);
        assert_eq!(
            decision.action_buttons,
            vec![ActionButton::with_target("snooze_task", "42")]
        );
    }

    #[test]
    fn call_keeps_spoken_briefing() {
        let mut input = raw("CALL", 9.0);
        input.spoken_briefing = Some("  Your 3pm moved to 2pm.  ".into());
        let decision = validate(input);
        assert_eq!(decision.spoken_briefing(), Some("Your 3pm moved to 2pm."));

        let mut input = raw("TEXT", 9.0);
        input.spoken_briefing = Some("ignored".into());
        assert_eq!(validate(input).spoken_briefing(), None);
    }

    #[test]
    fn json_payload_accepts_camel_case_buttons() {
        let raw = RawDecision::from_json(
            r#"{"decision":"TEXT","urgency":4,"summary":"s","reasoning":"r","actionButtons":["pause"]}"#,
        )
        .unwrap();
        assert_eq!(raw.action_buttons, Some(vec!["pause".to_string()]));
    }

    #[test]
    fn malformed_json_resolves_to_fallback() {
        let decision = resolve(RawDecision::from_json("not json"));
        assert!(decision.is_fallback());
        assert_eq!(decision.kind, DecisionKind::None);
    }

    #[test]
    fn transport_failure_resolves_to_fallback() {
        let decision = resolve(Err(DecisionError::Timeout { timeout_secs: 30 }));
        assert!(decision.is_fallback());
        assert!(decision.reasoning.contains("30"));
    }

    proptest! {
        #[test]
        fn finite_urgency_always_lands_in_range(urgency in -1.0e6f64..1.0e6) {
            let clamped = clamp_urgency(urgency).unwrap();
            prop_assert!((1..=10).contains(&clamped));
        }

        #[test]
        fn in_range_integers_are_preserved(urgency in 1u8..=10) {
            prop_assert_eq!(clamp_urgency(f64::from(urgency)), Some(urgency));
        }
    }
}
