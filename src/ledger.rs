//! Caller-owned sleep-debt accumulator
//!
//! The pipeline itself keeps no per-user state. Hosts that run the agent on a
//! schedule can carry a [`SleepDebtLedger`] between cycles: it feeds its
//! running total into each reading and adjusts it from each decision.

use serde::{Deserialize, Serialize};

use crate::schema::RawReading;
use crate::types::{ActionRecord, Urgency};

/// Debt added after a LOW-urgency decision (hours)
pub const CALM_CYCLE_DEBT_HOURS: f64 = 0.1;

/// Debt recovered after any other decision (hours)
pub const INTERVENTION_RECOVERY_HOURS: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SleepDebtLedger {
    sleep_debt_hours: f64,
}

impl SleepDebtLedger {
    pub fn new(sleep_debt_hours: f64) -> Self {
        Self { sleep_debt_hours }
    }

    pub fn sleep_debt_hours(&self) -> f64 {
        self.sleep_debt_hours
    }

    /// Overwrite the reading's debt with the running total
    pub fn apply_to(&self, reading: &mut RawReading) {
        reading.sleep_debt_hours = self.sleep_debt_hours;
    }

    /// Update the total from the decision made for the last cycle
    pub fn record(&mut self, action: &ActionRecord) -> f64 {
        self.sleep_debt_hours += match action.urgency {
            Urgency::Low => CALM_CYCLE_DEBT_HOURS,
            Urgency::Medium | Urgency::High => -INTERVENTION_RECOVERY_HOURS,
        };
        self.sleep_debt_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{no_action, safe_default};
    use chrono::DateTime;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_low_urgency_accrues_debt() {
        let mut ledger = SleepDebtLedger::new(2.3);
        ledger.record(&no_action());
        assert!(close(ledger.sleep_debt_hours(), 2.4));
    }

    #[test]
    fn test_intervention_recovers_debt() {
        let mut ledger = SleepDebtLedger::new(2.3);
        let total = ledger.record(&safe_default());
        assert!(close(total, 2.0));
    }

    #[test]
    fn test_surplus_is_allowed() {
        let mut ledger = SleepDebtLedger::default();
        ledger.record(&safe_default());
        assert!(close(ledger.sleep_debt_hours(), -0.3));
    }

    #[test]
    fn test_apply_to_reading() {
        let now = DateTime::parse_from_rfc3339("2024-01-15T22:00:00Z").unwrap();
        let mut reading = RawReading::neutral(now);
        SleepDebtLedger::new(1.7).apply_to(&mut reading);
        assert_eq!(reading.sleep_debt_hours, 1.7);
    }

    #[test]
    fn test_ledger_serialization() {
        let json = serde_json::to_string(&SleepDebtLedger::new(2.5)).unwrap();
        assert_eq!(json, r#"{"sleep_debt_hours":2.5}"#);
        let back: SleepDebtLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sleep_debt_hours(), 2.5);
    }
}
