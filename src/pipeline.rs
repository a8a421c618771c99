//! Pipeline orchestration
//!
//! This module provides the public API for SleepGuard.
//! It runs one reading through the full pipeline: parse → validate → estimate
//! risk → arbitrate → materialize the action value.

use serde::Serialize;
use tracing::{debug, info_span};
use uuid::Uuid;

use crate::config::Config;
use crate::decision::{DecisionArbiter, Fallback, StatsSnapshot};
use crate::error::ComputeError;
use crate::materialize;
use crate::reasoning::{GeminiClient, ReasoningService};
use crate::risk::RiskEstimator;
use crate::schema::{RawReading, ReadingAdapter};
use crate::types::{ActionRecord, RiskBundle};

/// Result of one pipeline run: the intermediate bundle and the chosen action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub risk: RiskBundle,
    pub action: ActionRecord,
}

/// Convert a reading JSON to an action record JSON (stateless, one-shot).
///
/// Uses the default configuration and takes the API key from the environment;
/// without one, the decision comes from the rule table.
///
/// # Example
/// ```ignore
/// let action_json = reading_to_action(reading_json)?;
/// ```
pub fn reading_to_action(reading_json: String) -> Result<String, ComputeError> {
    let guard = SleepGuard::from_config(&Config::default())?;
    let assessment = guard.process_json(&reading_json)?;
    to_json(&assessment.action)
}

/// Convert a reading JSON to a risk bundle JSON. Never touches the network.
pub fn reading_to_risk(reading_json: String) -> Result<String, ComputeError> {
    let reading = ReadingAdapter::parse(&reading_json)?;
    let bundle = RiskEstimator::default().estimate(&reading)?;
    to_json(&bundle)
}

/// Reusable processor holding the estimator and the arbiter.
///
/// Holds no per-user state; one instance can serve concurrent callers.
pub struct SleepGuard {
    estimator: RiskEstimator,
    arbiter: DecisionArbiter,
}

impl Default for SleepGuard {
    fn default() -> Self {
        Self::offline(&Config::default())
    }
}

impl SleepGuard {
    pub fn new(estimator: RiskEstimator, arbiter: DecisionArbiter) -> Self {
        Self { estimator, arbiter }
    }

    /// Processor backed by the Gemini client, API key from the environment
    pub fn from_config(config: &Config) -> Result<Self, ComputeError> {
        let client = GeminiClient::from_env(&config.arbiter)?;
        if !client.has_credentials() {
            debug!("No API key found, decisions will come from the fallback");
        }
        Ok(Self::with_service(client, config))
    }

    /// Processor backed by any reasoning service
    pub fn with_service<S>(service: S, config: &Config) -> Self
    where
        S: ReasoningService + 'static,
    {
        Self::new(
            RiskEstimator::new(config.estimator.clone()),
            DecisionArbiter::with_service(service, config.arbiter.clone(), &config.fallback),
        )
    }

    /// Processor that never calls out; every decision comes from the fallback
    pub fn offline(config: &Config) -> Self {
        Self::new(
            RiskEstimator::new(config.estimator.clone()),
            DecisionArbiter::offline(Fallback::from_config(&config.fallback)),
        )
    }

    pub fn estimator(&self) -> &RiskEstimator {
        &self.estimator
    }

    pub fn arbiter(&self) -> &DecisionArbiter {
        &self.arbiter
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.arbiter.stats()
    }

    /// Run one validated reading through the pipeline
    pub fn process(&self, reading: &RawReading) -> Result<Assessment, ComputeError> {
        let span = info_span!("assess", request_id = %Uuid::new_v4());
        let _enter = span.enter();

        // Stage 1: Estimate risk (rejects invalid readings)
        let risk = self.estimator.estimate(reading)?;

        // Stage 2: Decide and materialize
        let action = self.decide_bundle(&risk);

        Ok(Assessment { risk, action })
    }

    /// Parse a reading JSON and run it through the pipeline
    pub fn process_json(&self, reading_json: &str) -> Result<Assessment, ComputeError> {
        let reading = ReadingAdapter::parse(reading_json)?;
        self.process(&reading)
    }

    /// Decide on an action for an existing bundle, value filled in where computable
    pub fn decide_bundle(&self, bundle: &RiskBundle) -> ActionRecord {
        let record = self.arbiter.decide(bundle);
        materialize::apply(record, bundle)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ComputeError> {
    serde_json::to_string(value).map_err(|e| ComputeError::EncodingError(e.to_string()))
}
