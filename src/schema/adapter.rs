//! Adapter for converting wire payloads into typed sensor readings
//!
//! Parses the phone's JSON, resolves timestamps, fills neutral defaults for
//! absent optional fields and validates the result.

use crate::error::ComputeError;
use crate::schema::reading::*;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Default nightly sleep goal when the client sends none (hours)
pub const DEFAULT_SLEEP_GOAL_HOURS: f64 = 8.0;

/// Naive layouts accepted in addition to RFC 3339, interpreted as UTC
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Adapter for converting reading payloads to [`RawReading`]
pub struct ReadingAdapter;

impl ReadingAdapter {
    /// Parse and validate a single reading
    pub fn parse(json: &str) -> Result<RawReading, ComputeError> {
        let payload: ReadingPayload = serde_json::from_str(json)
            .map_err(|e| ComputeError::ParseError(format!("Failed to parse reading: {}", e)))?;
        Self::to_reading(&payload)
    }

    /// Parse a JSON array of reading payloads (not yet converted)
    pub fn parse_array(json: &str) -> Result<Vec<ReadingPayload>, ComputeError> {
        let payloads: Vec<ReadingPayload> = serde_json::from_str(json)?;
        Ok(payloads)
    }

    /// Parse NDJSON (newline-delimited JSON) containing reading payloads
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ReadingPayload>, ComputeError> {
        let mut payloads = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ReadingPayload>(trimmed) {
                Ok(payload) => payloads.push(payload),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(payloads)
    }

    /// Convert a wire payload into a validated reading
    pub fn to_reading(payload: &ReadingPayload) -> Result<RawReading, ComputeError> {
        let current_time = match payload.timestamp.as_deref() {
            Some(ts) => parse_instant(ts)?,
            None => return Err(ComputeError::MissingField("timestamp".to_string())),
        };

        let next_alarm = payload
            .alarm_time
            .as_deref()
            .map(parse_instant)
            .transpose()?;

        let mut caffeine_log = Vec::with_capacity(payload.caffeine_log.len());
        for (index, entry) in payload.caffeine_log.iter().enumerate() {
            let amount_mg = entry
                .mg
                .ok_or_else(|| ComputeError::MissingField(format!("caffeine_log[{index}].mg")))?;
            let taken_at = match entry.time.as_deref() {
                Some(ts) => parse_instant(ts)?,
                None => {
                    return Err(ComputeError::MissingField(format!(
                        "caffeine_log[{index}].time"
                    )))
                }
            };
            caffeine_log.push(CaffeineIntake { amount_mg, taken_at });
        }

        let reading = RawReading {
            current_time,
            next_alarm,
            caffeine_log,
            screen_minutes: payload.screen_total_minutes_last_2hr.unwrap_or(0.0),
            brightness: payload.brightness_level.unwrap_or(0.0),
            noise_db: payload.noise_db_last_5min.unwrap_or(0.0),
            sleep_debt_hours: payload.sleep_debt_hours.unwrap_or(0.0),
            sleep_goal_hours: payload.sleep_goal_hours.unwrap_or(DEFAULT_SLEEP_GOAL_HOURS),
            recent_actions: payload.recent_actions.clone(),
        };

        reading.validate()?;
        Ok(reading)
    }

    /// Validate a batch of payloads, returning only the failures
    pub fn validate_payloads(payloads: &[ReadingPayload]) -> Vec<ReadingIssue> {
        payloads
            .iter()
            .enumerate()
            .filter_map(|(index, payload)| {
                Self::to_reading(payload).err().map(|e| ReadingIssue {
                    index,
                    timestamp: payload.timestamp.clone(),
                    error: e.to_string(),
                })
            })
            .collect()
    }
}

/// A payload that failed conversion
#[derive(Debug)]
pub struct ReadingIssue {
    pub index: usize,
    pub timestamp: Option<String>,
    pub error: String,
}

/// Parse an ISO-8601 instant. Offset-less values are taken as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<FixedOffset>, ComputeError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(trimmed, layout).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| ComputeError::DateParseError(format!("Unrecognized instant: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn sample_reading_json() -> &'static str {
        r#"{
            "timestamp": "2024-01-15T22:00:00",
            "alarm_time": "2024-01-16T06:30:00",
            "caffeine_log": [
                { "type": "coffee", "mg": 95.0, "time": "2024-01-15T15:00:00" },
                { "type": "espresso", "mg": 80.0, "time": "2024-01-15T19:30:00.250000" }
            ],
            "screen_total_minutes_last_2hr": 65,
            "brightness_level": 0.6,
            "noise_db_last_5min": 55,
            "sleep_debt_hours": 1.2,
            "sleep_goal_hours": 7.5,
            "recent_actions": ["REDUCE_BRIGHTNESS"]
        }"#
    }

    #[test]
    fn test_parse_full_reading() {
        let reading = ReadingAdapter::parse(sample_reading_json()).unwrap();

        assert_eq!(reading.caffeine_log.len(), 2);
        assert_eq!(reading.caffeine_log[0].amount_mg, 95.0);
        assert_eq!(reading.screen_minutes, 65.0);
        assert_eq!(reading.brightness, 0.6);
        assert_eq!(reading.noise_db, 55.0);
        assert_eq!(reading.sleep_goal_hours, 7.5);
        assert_eq!(reading.recent_actions, vec![Action::ReduceBrightness]);
        assert!(reading.next_alarm.is_some());
    }

    #[test]
    fn test_missing_optionals_default_to_neutral() {
        let reading = ReadingAdapter::parse(r#"{"timestamp":"2024-01-15T22:00:00Z"}"#).unwrap();

        assert!(reading.caffeine_log.is_empty());
        assert!(reading.next_alarm.is_none());
        assert_eq!(reading.screen_minutes, 0.0);
        assert_eq!(reading.brightness, 0.0);
        assert_eq!(reading.sleep_debt_hours, 0.0);
        assert_eq!(reading.sleep_goal_hours, DEFAULT_SLEEP_GOAL_HOURS);
    }

    #[test]
    fn test_missing_timestamp_is_rejected() {
        let err = ReadingAdapter::parse(r#"{"noise_db_last_5min": 50}"#).unwrap_err();
        assert!(matches!(err, ComputeError::MissingField(f) if f == "timestamp"));
    }

    #[test]
    fn test_malformed_timestamp_is_rejected() {
        let err = ReadingAdapter::parse(r#"{"timestamp":"yesterday-ish"}"#).unwrap_err();
        assert!(matches!(err, ComputeError::DateParseError(_)));
    }

    #[test]
    fn test_caffeine_entry_without_time_is_rejected() {
        let json = r#"{"timestamp":"2024-01-15T22:00:00Z","caffeine_log":[{"mg":95.0}]}"#;
        let err = ReadingAdapter::parse(json).unwrap_err();
        assert!(matches!(err, ComputeError::MissingField(f) if f == "caffeine_log[0].time"));
    }

    #[test]
    fn test_future_caffeine_is_a_validation_error() {
        let json = r#"{"timestamp":"2024-01-15T22:00:00Z","caffeine_log":[{"mg":95.0,"time":"2024-01-15T23:00:00Z"}]}"#;
        let err = ReadingAdapter::parse(json).unwrap_err();
        assert!(matches!(err, ComputeError::Validation(_)));
    }

    #[test]
    fn test_parse_instant_keeps_offset() {
        let dt = parse_instant("2024-01-16T06:30:00+09:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(dt.format("%H:%M").to_string(), "06:30");
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = "{\"timestamp\":\"2024-01-15T22:00:00Z\"}\n\n{\"timestamp\":\"2024-01-15T22:15:00Z\",\"noise_db\":70}\n";
        let payloads = ReadingAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1].noise_db_last_5min, Some(70.0));
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"timestamp\":\"2024-01-15T22:00:00Z\"}\nnot json\n";
        let err = ReadingAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_validate_payloads() {
        let payloads = ReadingAdapter::parse_array(
            r#"[{"timestamp":"2024-01-15T22:00:00Z"},{"brightness_level":0.5},{"timestamp":"2024-01-15T22:00:00Z","brightness_level":3.0}]"#,
        )
        .unwrap();

        let issues = ReadingAdapter::validate_payloads(&payloads);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].index, 1);
        assert_eq!(issues[1].index, 2);
    }
}
