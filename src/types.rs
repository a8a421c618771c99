//! Core types for the SleepGuard pipeline
//!
//! This module defines the data structures that flow out of each stage of the
//! pipeline: the risk bundle produced by the estimator and the action record
//! produced by the arbiter.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Intervention kinds the arbiter may recommend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Warn,
    AdjustAlarm,
    ReduceBrightness,
    #[serde(alias = "PLAY_WHITE_NOISE")]
    EnableWhiteNoise,
    BlockApps,
    DigitalWindDown,
    #[serde(alias = "NONE")]
    NoAction,
}

impl Action {
    /// Every action in prompt order
    pub const ALL: [Action; 7] = [
        Action::Warn,
        Action::AdjustAlarm,
        Action::ReduceBrightness,
        Action::EnableWhiteNoise,
        Action::BlockApps,
        Action::DigitalWindDown,
        Action::NoAction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Warn => "WARN",
            Action::AdjustAlarm => "ADJUST_ALARM",
            Action::ReduceBrightness => "REDUCE_BRIGHTNESS",
            Action::EnableWhiteNoise => "ENABLE_WHITE_NOISE",
            Action::BlockApps => "BLOCK_APPS",
            Action::DigitalWindDown => "DIGITAL_WIND_DOWN",
            Action::NoAction => "NO_ACTION",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    /// Accepts the canonical names plus the legacy spellings older prompts produced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLAY_WHITE_NOISE" => Ok(Action::EnableWhiteNoise),
            "NONE" => Ok(Action::NoAction),
            other => Action::ALL
                .iter()
                .copied()
                .find(|a| a.as_str() == other)
                .ok_or_else(|| other.to_string()),
        }
    }
}

/// How soon the user should act on a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Low, Urgency::Medium, Urgency::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
        }
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Urgency::ALL
            .iter()
            .copied()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Provenance tag for an action record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionSource {
    /// Produced by the remote reasoning service and validated locally
    Model,
    /// Produced by the deterministic fallback
    RuleFallback,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Model => "MODEL",
            DecisionSource::RuleFallback => "RULE_FALLBACK",
        }
    }
}

/// Executable payload attached to an action (serialized as a bare JSON scalar)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

/// Caller-owned context carried alongside the scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleContext {
    /// Nightly sleep goal (hours)
    pub sleep_goal_hours: f64,
    /// Actions issued on previous requests, most recent last
    #[serde(default)]
    pub recent_actions: Vec<Action>,
}

impl Default for BundleContext {
    fn default() -> Self {
        Self {
            sleep_goal_hours: 8.0,
            recent_actions: Vec::new(),
        }
    }
}

/// Normalized summary of current sleep-disruption factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBundle {
    /// Decayed caffeine still in circulation (mg, not normalized)
    pub remaining_caffeine_mg: f64,
    /// Screen-exposure melatonin suppression risk (0-1)
    pub melatonin_suppression_risk: f64,
    /// Ambient noise disruption risk (0-1)
    pub noise_disruption_risk: f64,
    /// Accumulated sleep debt (hours, negative means surplus)
    pub sleep_debt_hours: f64,
    /// Bucketed sleep-debt risk (0.2, 0.6 or 1.0)
    #[serde(default)]
    pub sleep_debt_risk: f64,
    /// Hours until the next scheduled wake
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_target_sleep: Option<f64>,
    /// Deadline pressure inside the final four hours (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_pressure_risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_alarm: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub context: BundleContext,
}

/// A single recommended intervention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,
    pub urgency: Urgency,
    /// Action-specific payload; null when the action needs none
    pub value: Option<ActionValue>,
    pub notification_message: String,
    /// Confidence in the recommendation (0-1)
    pub confidence: f64,
    pub reasoning_summary: String,
    pub source: DecisionSource,
}

impl ActionRecord {
    /// Replace the payload, keeping every other field
    pub fn with_value(self, value: Option<ActionValue>) -> Self {
        Self { value, ..self }
    }
}
