//! Deterministic fallback policies
//!
//! Used whenever the reasoning service cannot produce a valid action. Both
//! policies are total functions of the risk bundle: no I/O, no failure modes.

use serde::{Deserialize, Serialize};

use crate::types::{Action, ActionRecord, ActionValue, DecisionSource, RiskBundle, Urgency};

/// Bundle field a trigger inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    RemainingCaffeineMg,
    MelatoninSuppressionRisk,
    NoiseDisruptionRisk,
    SleepDebtHours,
    SleepDebtRisk,
    TimePressureRisk,
}

impl Signal {
    /// Read the signal from a bundle. Absent optional signals read as zero.
    pub fn read(&self, bundle: &RiskBundle) -> f64 {
        match self {
            Signal::RemainingCaffeineMg => bundle.remaining_caffeine_mg,
            Signal::MelatoninSuppressionRisk => bundle.melatonin_suppression_risk,
            Signal::NoiseDisruptionRisk => bundle.noise_disruption_risk,
            Signal::SleepDebtHours => bundle.sleep_debt_hours,
            Signal::SleepDebtRisk => bundle.sleep_debt_risk,
            Signal::TimePressureRisk => bundle.time_pressure_risk.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Strictly greater than
    Above,
    /// Greater than or equal
    AtLeast,
}

/// One threshold test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub signal: Signal,
    #[serde(default = "default_comparison")]
    pub op: Comparison,
    pub threshold: f64,
}

fn default_comparison() -> Comparison {
    Comparison::Above
}

impl Trigger {
    pub fn above(signal: Signal, threshold: f64) -> Self {
        Self {
            signal,
            op: Comparison::Above,
            threshold,
        }
    }

    pub fn at_least(signal: Signal, threshold: f64) -> Self {
        Self {
            signal,
            op: Comparison::AtLeast,
            threshold,
        }
    }

    pub fn fires(&self, bundle: &RiskBundle) -> bool {
        let value = self.signal.read(bundle);
        match self.op {
            Comparison::Above => value > self.threshold,
            Comparison::AtLeast => value >= self.threshold,
        }
    }
}

/// A rule fires when any of its triggers fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub when: Vec<Trigger>,
    pub action: Action,
    pub urgency: Urgency,
    #[serde(default)]
    pub value: Option<ActionValue>,
    pub notification_message: String,
    pub confidence: f64,
    pub reasoning_summary: String,
}

impl Rule {
    pub fn matches(&self, bundle: &RiskBundle) -> bool {
        self.when.iter().any(|t| t.fires(bundle))
    }

    fn to_record(&self) -> ActionRecord {
        ActionRecord {
            action: self.action,
            urgency: self.urgency,
            value: self.value.clone(),
            notification_message: self.notification_message.clone(),
            confidence: self.confidence,
            reasoning_summary: self.reasoning_summary.clone(),
            source: DecisionSource::RuleFallback,
        }
    }
}

/// Built-in rules, highest priority first
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "wind_down".to_string(),
            when: vec![
                Trigger::above(Signal::MelatoninSuppressionRisk, 1.5),
                Trigger::above(Signal::SleepDebtHours, 2.0),
            ],
            action: Action::DigitalWindDown,
            urgency: Urgency::Medium,
            value: None,
            notification_message: "High blue-light/sleep debt detected. Time to disconnect."
                .to_string(),
            confidence: 0.6,
            reasoning_summary: "Rule-based safety trigger for melatonin protection.".to_string(),
        },
        Rule {
            name: "caffeine_alarm_extension".to_string(),
            when: vec![Trigger::above(Signal::RemainingCaffeineMg, 350.0)],
            action: Action::AdjustAlarm,
            urgency: Urgency::High,
            value: None,
            notification_message: "High caffeine detected. Extending sleep schedule.".to_string(),
            confidence: 0.9,
            reasoning_summary: "Caffeine half-life requires extended recovery time.".to_string(),
        },
        Rule {
            name: "noise_masking".to_string(),
            when: vec![Trigger::at_least(Signal::NoiseDisruptionRisk, 0.8)],
            action: Action::EnableWhiteNoise,
            urgency: Urgency::Medium,
            value: None,
            notification_message: "Loud surroundings detected. Starting white noise.".to_string(),
            confidence: 0.7,
            reasoning_summary: "Ambient noise is above the sleep-disruption threshold."
                .to_string(),
        },
    ]
}

/// Threshold rules evaluated in priority order
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule, or the no-action record
    pub fn evaluate(&self, bundle: &RiskBundle) -> ActionRecord {
        self.rules
            .iter()
            .find(|rule| rule.matches(bundle))
            .map(Rule::to_record)
            .unwrap_or_else(no_action)
    }
}

/// Record returned when no rule fires
pub fn no_action() -> ActionRecord {
    ActionRecord {
        action: Action::NoAction,
        urgency: Urgency::Low,
        value: None,
        notification_message: "Conditions optimal for sleep.".to_string(),
        confidence: 1.0,
        reasoning_summary: "No critical thresholds breached.".to_string(),
        source: DecisionSource::RuleFallback,
    }
}

/// Fixed warning used when the rule table is disabled
pub fn safe_default() -> ActionRecord {
    ActionRecord {
        action: Action::Warn,
        urgency: Urgency::Medium,
        value: None,
        notification_message:
            "Potential sleep risk detected. Please consider reducing screen exposure.".to_string(),
        confidence: 0.5,
        reasoning_summary: "Fallback action issued because the reasoning service failed."
            .to_string(),
        source: DecisionSource::RuleFallback,
    }
}
