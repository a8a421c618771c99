//! Sensor reading schema
//!
//! Two layers:
//! - [`ReadingPayload`]: the loose wire shape sent by the phone, every field optional
//! - [`RawReading`]: the typed reading the estimator consumes, with parsed instants

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Action;

/// Wire-level caffeine log entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaffeineEntryPayload {
    /// Dose (mg)
    pub mg: Option<f64>,
    /// Intake instant (ISO-8601)
    pub time: Option<String>,
    /// Drink label, informational only
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Wire-level sensor reading as posted by the mobile client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingPayload {
    /// Current instant (ISO-8601), required
    pub timestamp: Option<String>,
    /// Next scheduled wake (ISO-8601)
    #[serde(default, alias = "next_alarm")]
    pub alarm_time: Option<String>,
    #[serde(default)]
    pub caffeine_log: Vec<CaffeineEntryPayload>,
    #[serde(default, alias = "screen_minutes")]
    pub screen_total_minutes_last_2hr: Option<f64>,
    #[serde(default, alias = "brightness")]
    pub brightness_level: Option<f64>,
    #[serde(default, alias = "noise_db")]
    pub noise_db_last_5min: Option<f64>,
    #[serde(default)]
    pub sleep_debt_hours: Option<f64>,
    #[serde(default)]
    pub sleep_goal_hours: Option<f64>,
    #[serde(default)]
    pub recent_actions: Vec<Action>,
}

/// A single caffeine intake
#[derive(Debug, Clone, PartialEq)]
pub struct CaffeineIntake {
    pub amount_mg: f64,
    pub taken_at: DateTime<FixedOffset>,
}

/// Validated-shape sensor reading for one request
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub current_time: DateTime<FixedOffset>,
    pub next_alarm: Option<DateTime<FixedOffset>>,
    pub caffeine_log: Vec<CaffeineIntake>,
    /// Screen-on minutes over the trailing window
    pub screen_minutes: f64,
    /// Display brightness (0-1)
    pub brightness: f64,
    /// Ambient noise (dB)
    pub noise_db: f64,
    /// Accumulated sleep debt (hours, negative means surplus)
    pub sleep_debt_hours: f64,
    pub sleep_goal_hours: f64,
    pub recent_actions: Vec<Action>,
}

impl RawReading {
    /// A neutral reading at `now`: no caffeine, no screen, silence, no debt
    pub fn neutral(now: DateTime<FixedOffset>) -> Self {
        Self {
            current_time: now,
            next_alarm: None,
            caffeine_log: Vec::new(),
            screen_minutes: 0.0,
            brightness: 0.0,
            noise_db: 0.0,
            sleep_debt_hours: 0.0,
            sleep_goal_hours: 8.0,
            recent_actions: Vec::new(),
        }
    }

    /// Check the caller contract. Nothing is coerced: any violation rejects the reading.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_finite("screen_minutes", self.screen_minutes)?;
        require_finite("brightness", self.brightness)?;
        require_finite("noise_db", self.noise_db)?;
        require_finite("sleep_debt_hours", self.sleep_debt_hours)?;
        require_finite("sleep_goal_hours", self.sleep_goal_hours)?;

        if self.screen_minutes < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "screen_minutes".to_string(),
                value: self.screen_minutes,
                expected: ">= 0".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.brightness) {
            return Err(ValidationError::OutOfRange {
                field: "brightness".to_string(),
                value: self.brightness,
                expected: "0..=1".to_string(),
            });
        }

        if self.sleep_goal_hours <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "sleep_goal_hours".to_string(),
                value: self.sleep_goal_hours,
                expected: "> 0".to_string(),
            });
        }

        for (index, intake) in self.caffeine_log.iter().enumerate() {
            require_finite("caffeine_log.mg", intake.amount_mg)?;
            if intake.amount_mg <= 0.0 {
                return Err(ValidationError::NonPositiveDose {
                    index,
                    amount_mg: intake.amount_mg,
                });
            }
            if intake.taken_at > self.current_time {
                return Err(ValidationError::FutureIntake {
                    index,
                    taken_at: intake.taken_at.to_rfc3339(),
                    now: self.current_time.to_rfc3339(),
                });
            }
        }

        Ok(())
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite {
            field: field.to_string(),
        })
    }
}

/// Validation errors for sensor readings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field {field} is not a finite number")]
    NonFinite { field: String },

    #[error("Field {field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: String,
        value: f64,
        expected: String,
    },

    #[error("Caffeine entry {index} has non-positive dose {amount_mg} mg")]
    NonPositiveDose { index: usize, amount_mg: f64 },

    #[error("Caffeine entry {index} at {taken_at} is later than the reading time {now}")]
    FutureIntake {
        index: usize,
        taken_at: String,
        now: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-15T22:00:00Z").unwrap()
    }

    #[test]
    fn test_neutral_reading_is_valid() {
        assert!(RawReading::neutral(now()).validate().is_ok());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut reading = RawReading::neutral(now());
        reading.noise_db = f64::NAN;
        assert_eq!(
            reading.validate(),
            Err(ValidationError::NonFinite {
                field: "noise_db".to_string()
            })
        );

        let mut reading = RawReading::neutral(now());
        reading.sleep_debt_hours = f64::INFINITY;
        assert!(reading.validate().is_err());
    }

    #[test]
    fn test_rejects_brightness_out_of_range() {
        let mut reading = RawReading::neutral(now());
        reading.brightness = 1.2;
        assert!(matches!(
            reading.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_negative_sleep_debt_is_allowed() {
        let mut reading = RawReading::neutral(now());
        reading.sleep_debt_hours = -1.5;
        assert!(reading.validate().is_ok());
    }

    #[test]
    fn test_rejects_future_caffeine() {
        let mut reading = RawReading::neutral(now());
        reading.caffeine_log.push(CaffeineIntake {
            amount_mg: 95.0,
            taken_at: now() + Duration::minutes(10),
        });

        let err = reading.validate().unwrap_err();
        assert!(matches!(err, ValidationError::FutureIntake { index: 0, .. }));
    }

    #[test]
    fn test_rejects_zero_dose() {
        let mut reading = RawReading::neutral(now());
        reading.caffeine_log.push(CaffeineIntake {
            amount_mg: 0.0,
            taken_at: now() - Duration::hours(1),
        });
        assert!(matches!(
            reading.validate(),
            Err(ValidationError::NonPositiveDose { index: 0, .. })
        ));
    }
}
