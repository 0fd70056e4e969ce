//! Property tests for the gating policy.
//!
//! These drive `GatingEngine` through generated windows, times and cooldown
//! histories rather than hand-picked cases.

use chrono::{DateTime, Duration, TimeZone, Utc};
use nudgewatch_core::gating::{
    GatingConfig, GatingEngine, GatingResult, PickupConfig, TimeOfDay, TimeWindow, WeekendMode,
};
use proptest::prelude::*;

// Monday 2026-03-02 00:00 UTC
fn monday_midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
}

fn tod(minute_of_day: u32) -> TimeOfDay {
    TimeOfDay::new((minute_of_day / 60) as u8, (minute_of_day % 60) as u8).unwrap()
}

fn weekend_mode() -> impl Strategy<Value = WeekendMode> {
    prop_oneof![
        Just(WeekendMode::Quiet),
        Just(WeekendMode::Reduced),
        Just(WeekendMode::Normal),
    ]
}

fn open_config(cooldown_minutes: u32) -> GatingConfig {
    GatingConfig {
        cooldown_minutes,
        quiet_hours: None,
        focus_hours: None,
        weekend_mode: WeekendMode::Normal,
        weekend_urgency_threshold: 7,
        pickup: PickupConfig::default(),
        utc_offset_minutes: Some(0),
    }
}

proptest! {
    #[test]
    fn test_inside_quiet_hours_always_blocks(
        start in 0u32..1440,
        span in 1u32..1440,
        offset_frac in 0.0f64..1.0,
        day in 0i64..14,
        cooldown in 0u32..600,
        since_last in 0i64..2000,
        mode in weekend_mode(),
    ) {
        let end = (start + span) % 1440;
        let offset = ((span as f64) * offset_frac) as u32 % span;
        let minute = (start + offset) % 1440;

        let window = TimeWindow::new(tod(start), tod(end));
        let config = GatingConfig {
            quiet_hours: Some(window),
            weekend_mode: mode,
            ..open_config(cooldown)
        };
        let now = monday_midnight() + Duration::days(day) + Duration::minutes(i64::from(minute));
        let last = Some(now - Duration::minutes(since_last));

        let result = GatingEngine::new(config).evaluate(now, &last);
        let reason = result.reason().unwrap_or_default().to_string();
        prop_assert!(reason.starts_with("quiet hours"), "{reason} at minute {minute}");
        prop_assert!(reason.contains(&window.to_string()));
    }

    #[test]
    fn test_cooldown_reports_elapsed_and_required(
        cooldown in 1u32..1000,
        frac in 0.0f64..1.0,
        minute in 0i64..1440,
    ) {
        let elapsed = ((cooldown as f64) * frac) as i64;
        prop_assume!(elapsed < i64::from(cooldown));
        let now = monday_midnight() + Duration::minutes(minute);
        let last = Some(now - Duration::minutes(elapsed));

        let result = GatingEngine::new(open_config(cooldown)).evaluate(now, &last);
        prop_assert_eq!(
            result,
            GatingResult::blocked(format!("cooldown: {elapsed} of {cooldown} minutes elapsed"))
        );
    }

    #[test]
    fn test_cooldown_satisfied_proceeds(
        cooldown in 0u32..1000,
        extra in 0i64..1000,
        minute in 0i64..1440,
    ) {
        let now = monday_midnight() + Duration::minutes(minute);
        let last = Some(now - Duration::minutes(i64::from(cooldown) + extra));

        let result = GatingEngine::new(open_config(cooldown)).evaluate(now, &last);
        prop_assert_eq!(result, GatingResult::Proceed);
    }

    #[test]
    fn test_focus_hours_take_precedence(
        start in 0u32..1440,
        span in 1u32..1440,
        minute_frac in 0.0f64..1.0,
    ) {
        let end = (start + span) % 1440;
        let offset = ((span as f64) * minute_frac) as u32 % span;
        let minute = (start + offset) % 1440;
        let window = TimeWindow::new(tod(start), tod(end));

        let config = GatingConfig {
            focus_hours: Some(window),
            // Quiet hours covering the whole day except one minute.
            quiet_hours: Some(TimeWindow::new(tod(minute), tod((minute + 1439) % 1440))),
            ..open_config(120)
        };
        let now = monday_midnight() + Duration::minutes(i64::from(minute));

        let result = GatingEngine::new(config).evaluate(now, &None);
        let reason = result.reason().unwrap_or_default().to_string();
        prop_assert!(reason.starts_with("focus hours"), "{reason}");
    }
}

#[test]
fn test_weekend_quiet_blocks_saturday_and_sunday_only() {
    let config = GatingConfig {
        weekend_mode: WeekendMode::Quiet,
        ..open_config(0)
    };
    let engine = GatingEngine::new(config);
    for day in 0..7 {
        let now = monday_midnight() + Duration::days(day) + Duration::hours(12);
        let blocked = engine.evaluate(now, &None).is_blocked();
        assert_eq!(blocked, day >= 5, "day offset {day}");
    }
}
