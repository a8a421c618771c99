//! Action-value materialization
//!
//! Computes the executable payload the phone needs to carry out an action:
//! a brightness target, a white-noise toggle, the blocked app categories, or
//! the shifted alarm time.

use chrono::Duration;

use crate::types::{Action, ActionRecord, ActionValue, RiskBundle};

/// Screen brightness target for REDUCE_BRIGHTNESS (fraction of full)
pub const DIMMED_BRIGHTNESS: f64 = 0.3;

/// App categories blocked by BLOCK_APPS
pub const BLOCKED_APP_CATEGORIES: &[&str] = &["social", "games", "video"];

/// Alarm shift per hour of sleep debt (minutes)
pub const ALARM_MINUTES_PER_DEBT_HOUR: f64 = 30.0;

/// Largest alarm shift (minutes)
pub const MAX_ALARM_SHIFT_MINUTES: i64 = 90;

/// Payload for `action`, or `None` when the action carries no computed value
pub fn materialize(action: Action, bundle: &RiskBundle) -> Option<ActionValue> {
    match action {
        Action::ReduceBrightness => Some(ActionValue::Number(DIMMED_BRIGHTNESS)),
        Action::EnableWhiteNoise => Some(ActionValue::Flag(true)),
        Action::BlockApps => Some(ActionValue::Text(BLOCKED_APP_CATEGORIES.join(","))),
        Action::AdjustAlarm => shifted_alarm(bundle).map(ActionValue::Text),
        Action::Warn | Action::DigitalWindDown | Action::NoAction => None,
    }
}

/// Fill in the record's payload where one can be computed; otherwise keep it
pub fn apply(record: ActionRecord, bundle: &RiskBundle) -> ActionRecord {
    match materialize(record.action, bundle) {
        Some(value) => record.with_value(Some(value)),
        None => record,
    }
}

/// Minutes to push the alarm back: 30 per hour of debt, within 0..=90
pub fn alarm_shift_minutes(sleep_debt_hours: f64) -> i64 {
    let minutes = (sleep_debt_hours * ALARM_MINUTES_PER_DEBT_HOUR).trunc() as i64;
    minutes.clamp(0, MAX_ALARM_SHIFT_MINUTES)
}

/// New alarm as `HH:MM` wall-clock time in the alarm's own offset
fn shifted_alarm(bundle: &RiskBundle) -> Option<String> {
    let alarm = bundle.next_alarm?;
    let shifted = alarm + Duration::minutes(alarm_shift_minutes(bundle.sleep_debt_hours));
    Some(shifted.format("%H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BundleContext, DecisionSource, Urgency};
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    fn bundle(sleep_debt_hours: f64, alarm: Option<&str>) -> RiskBundle {
        RiskBundle {
            remaining_caffeine_mg: 0.0,
            melatonin_suppression_risk: 0.0,
            noise_disruption_risk: 0.0,
            sleep_debt_hours,
            sleep_debt_risk: 0.2,
            time_to_target_sleep: None,
            time_pressure_risk: None,
            current_time: None,
            next_alarm: alarm.map(|a| DateTime::parse_from_rfc3339(a).unwrap()),
            context: BundleContext::default(),
        }
    }

    #[test]
    fn test_fixed_payloads() {
        let b = bundle(0.0, None);
        assert_eq!(
            materialize(Action::ReduceBrightness, &b),
            Some(ActionValue::Number(0.3))
        );
        assert_eq!(
            materialize(Action::EnableWhiteNoise, &b),
            Some(ActionValue::Flag(true))
        );
        assert_eq!(
            materialize(Action::BlockApps, &b),
            Some(ActionValue::Text("social,games,video".to_string()))
        );
        assert_eq!(materialize(Action::NoAction, &b), None);
        assert_eq!(materialize(Action::Warn, &b), None);
    }

    #[test]
    fn test_alarm_shift_scales_with_debt() {
        let b = bundle(1.5, Some("2024-01-16T06:30:00Z"));
        assert_eq!(
            materialize(Action::AdjustAlarm, &b),
            Some(ActionValue::Text("07:15".to_string()))
        );
    }

    #[test]
    fn test_alarm_shift_caps_at_ninety_minutes() {
        let b = bundle(5.0, Some("2024-01-16T23:00:00Z"));
        // Wraps past midnight
        assert_eq!(
            materialize(Action::AdjustAlarm, &b),
            Some(ActionValue::Text("00:30".to_string()))
        );
    }

    #[test]
    fn test_alarm_shift_minutes() {
        assert_eq!(alarm_shift_minutes(0.0), 0);
        assert_eq!(alarm_shift_minutes(1.0), 30);
        assert_eq!(alarm_shift_minutes(1.99), 59);
        assert_eq!(alarm_shift_minutes(3.0), 90);
        assert_eq!(alarm_shift_minutes(10.0), 90);
        assert_eq!(alarm_shift_minutes(-2.0), 0);
    }

    #[test]
    fn test_alarm_uses_local_offset() {
        let b = bundle(1.0, Some("2024-01-16T06:30:00-05:00"));
        assert_eq!(
            materialize(Action::AdjustAlarm, &b),
            Some(ActionValue::Text("07:00".to_string()))
        );
    }

    #[test]
    fn test_no_alarm_no_value() {
        assert_eq!(materialize(Action::AdjustAlarm, &bundle(2.0, None)), None);
    }

    #[test]
    fn test_apply_keeps_existing_value_when_nothing_computed() {
        let record = ActionRecord {
            action: Action::AdjustAlarm,
            urgency: Urgency::High,
            value: Some(ActionValue::Text("30".to_string())),
            notification_message: "Extending sleep schedule.".to_string(),
            confidence: 0.9,
            reasoning_summary: String::new(),
            source: DecisionSource::Model,
        };

        let kept = apply(record.clone(), &bundle(2.0, None));
        assert_eq!(kept.value, Some(ActionValue::Text("30".to_string())));

        let filled = apply(record, &bundle(2.0, Some("2024-01-16T06:30:00Z")));
        assert_eq!(filled.value, Some(ActionValue::Text("07:30".to_string())));
        assert_eq!(filled.source, DecisionSource::Model);
    }
}
