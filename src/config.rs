//! Tunable constants
//!
//! Every threshold, decay constant and retry knob used by the pipeline lives
//! here. All structs deserialize with per-field defaults, so a partial JSON
//! file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ComputeError;
use crate::rules::Rule;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub estimator: EstimatorConfig,
    pub arbiter: ArbiterConfig,
    pub fallback: FallbackConfig,
}

impl Config {
    /// Parse a (possibly partial) JSON config
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| ComputeError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ComputeError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ComputeError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Reject values that would make the transfer functions degenerate
    pub fn check(&self) -> Result<(), ComputeError> {
        let est = &self.estimator;
        let positive = [
            ("caffeine_half_life_hours", est.caffeine_half_life_hours),
            ("caffeine_window_hours", est.caffeine_window_hours),
            ("screen_threshold_minutes", est.screen_threshold_minutes),
            ("noise_ramp_divisor", est.noise_ramp_divisor),
            ("noise_tail_span_db", est.noise_tail_span_db),
            ("time_pressure_window_hours", est.time_pressure_window_hours),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ComputeError::ConfigError(format!(
                    "estimator.{name} must be a positive number, got {value}"
                )));
            }
        }

        if est.noise_quiet_db >= est.noise_loud_db {
            return Err(ComputeError::ConfigError(format!(
                "estimator.noise_quiet_db ({}) must be below noise_loud_db ({})",
                est.noise_quiet_db, est.noise_loud_db
            )));
        }

        let unit = [
            ("noise_tail_floor", est.noise_tail_floor),
            ("noise_tail_gain", est.noise_tail_gain),
            ("debt_low_risk", est.debt_low_risk),
            ("debt_moderate_risk", est.debt_moderate_risk),
            ("debt_severe_risk", est.debt_severe_risk),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ComputeError::ConfigError(format!(
                    "estimator.{name} must be within 0..=1, got {value}"
                )));
            }
        }

        if est.debt_moderate_hours >= est.debt_severe_hours {
            return Err(ComputeError::ConfigError(
                "estimator.debt_moderate_hours must be below debt_severe_hours".to_string(),
            ));
        }

        if self.arbiter.max_attempts == 0 {
            return Err(ComputeError::ConfigError(
                "arbiter.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.arbiter.timeout_ms == 0 {
            return Err(ComputeError::ConfigError(
                "arbiter.timeout_ms must be at least 1".to_string(),
            ));
        }

        for (index, rule) in self.fallback.rules.iter().enumerate() {
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(ComputeError::ConfigError(format!(
                    "fallback.rules[{index}].confidence must be within 0..=1"
                )));
            }
            if rule.notification_message.trim().is_empty() {
                return Err(ComputeError::ConfigError(format!(
                    "fallback.rules[{index}].notification_message must not be empty"
                )));
            }
        }

        Ok(())
    }
}

/// Constants of the risk transfer functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// First-order clearance half-life (hours)
    pub caffeine_half_life_hours: f64,
    /// Intakes older than this contribute nothing (hours)
    pub caffeine_window_hours: f64,
    /// Screen minutes at which the duration signal saturates
    pub screen_threshold_minutes: f64,
    /// Extra weight per unit brightness (factor = 1 + gain * brightness)
    pub brightness_gain: f64,
    /// Below this level noise is harmless (dB)
    pub noise_quiet_db: f64,
    /// Start of the slow-rising tail (dB)
    pub noise_loud_db: f64,
    /// Divisor of the linear ramp between quiet and loud
    pub noise_ramp_divisor: f64,
    /// Risk at the start of the tail
    pub noise_tail_floor: f64,
    /// Risk gained across one tail span
    pub noise_tail_gain: f64,
    /// dB covered by one tail span
    pub noise_tail_span_db: f64,
    /// Debt at which risk moves from low to moderate (hours)
    pub debt_moderate_hours: f64,
    /// Debt at which risk becomes severe (hours)
    pub debt_severe_hours: f64,
    pub debt_low_risk: f64,
    pub debt_moderate_risk: f64,
    pub debt_severe_risk: f64,
    /// Time pressure rises inside this many hours before wake
    pub time_pressure_window_hours: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            caffeine_half_life_hours: 5.0,
            caffeine_window_hours: 12.0,
            screen_threshold_minutes: 60.0,
            brightness_gain: 0.5,
            noise_quiet_db: 45.0,
            noise_loud_db: 65.0,
            noise_ramp_divisor: 40.0,
            noise_tail_floor: 0.8,
            noise_tail_gain: 0.2,
            noise_tail_span_db: 35.0,
            debt_moderate_hours: 1.5,
            debt_severe_hours: 3.0,
            debt_low_risk: 0.2,
            debt_moderate_risk: 0.6,
            debt_severe_risk: 1.0,
            time_pressure_window_hours: 4.0,
        }
    }
}

/// Remote reasoning call settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Total attempts per decision, including the first
    pub max_attempts: u32,
    /// Per-attempt timeout (milliseconds)
    pub timeout_ms: u64,
    /// Backoff before the second attempt; doubles after each failure (milliseconds)
    pub initial_backoff_ms: u64,
    /// Upper bound on a single backoff (milliseconds)
    pub max_backoff_ms: u64,
    /// Model identifier on the generative-language endpoint
    pub model: String,
    /// Base URL of the generative-language REST API
    pub endpoint: String,
    pub temperature: f64,
}

impl ArbiterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff to wait after the given (zero-based) failed attempt
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_ms: 10_000,
            initial_backoff_ms: 500,
            max_backoff_ms: 4_000,
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.1,
        }
    }
}

/// Which deterministic policy answers when the model cannot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Fixed WARN record regardless of the bundle
    SafeDefault,
    /// Threshold rules evaluated in priority order
    #[default]
    RuleTable,
}

/// Fallback policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub mode: FallbackMode,
    /// Rules in priority order; the first match wins
    pub rules: Vec<Rule>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            mode: FallbackMode::default(),
            rules: crate::rules::default_rules(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(
            r#"{"estimator": {"caffeine_half_life_hours": 5.7}, "arbiter": {"max_attempts": 5}}"#,
        )
        .unwrap();

        assert_eq!(config.estimator.caffeine_half_life_hours, 5.7);
        assert_eq!(config.estimator.screen_threshold_minutes, 60.0);
        assert_eq!(config.arbiter.max_attempts, 5);
        assert_eq!(config.arbiter.timeout_ms, 10_000);
        assert_eq!(config.fallback, FallbackConfig::default());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let err = Config::from_json(r#"{"arbiter": {"max_attempts": 0}}"#).unwrap_err();
        assert!(matches!(err, ComputeError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_inverted_noise_breakpoints() {
        let err = Config::from_json(r#"{"estimator": {"noise_quiet_db": 70}}"#).unwrap_err();
        assert!(err.to_string().contains("noise_quiet_db"));
    }

    #[test]
    fn test_rejects_non_positive_half_life() {
        assert!(Config::from_json(r#"{"estimator": {"caffeine_half_life_hours": 0}}"#).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_debt_risk() {
        let err = Config::from_json(r#"{"estimator": {"debt_severe_risk": 5.0}}"#).unwrap_err();
        assert!(err.to_string().contains("debt_severe_risk"));
        assert!(Config::from_json(r#"{"estimator": {"debt_low_risk": -0.1}}"#).is_err());
        assert!(Config::from_json(r#"{"estimator": {"noise_tail_floor": 1.2}}"#).is_err());
        assert!(Config::from_json(r#"{"estimator": {"debt_moderate_risk": 1.0}}"#).is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = Config::from_json(r#"{"arbiter": {"timeout_ms": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let arbiter = ArbiterConfig::default();
        assert_eq!(arbiter.backoff_after(0), Duration::from_millis(500));
        assert_eq!(arbiter.backoff_after(1), Duration::from_millis(1_000));
        assert_eq!(arbiter.backoff_after(2), Duration::from_millis(2_000));
        assert_eq!(arbiter.backoff_after(10), Duration::from_millis(4_000));
    }

    #[test]
    fn test_fallback_mode_wire_name() {
        let config = Config::from_json(r#"{"fallback": {"mode": "safe_default"}}"#).unwrap();
        assert_eq!(config.fallback.mode, FallbackMode::SafeDefault);
        assert!(!config.fallback.rules.is_empty());
    }
}
