//! Decision arbitration
//!
//! The arbiter turns a risk bundle into exactly one action record. It tries
//! its strategies in order (normally the remote model) and ends at a
//! deterministic fallback that cannot fail, so `decide` is total.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ArbiterConfig, FallbackConfig, FallbackMode};
use crate::prompt::build_prompt;
use crate::reasoning::{ReasoningError, ReasoningService};
use crate::response::{parse_model_response, SchemaViolation};
use crate::rules::{safe_default, RuleTable};
use crate::types::{ActionRecord, DecisionSource, RiskBundle};

/// Why a strategy could not produce a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("Prompt construction failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Upstream(#[from] ReasoningError),

    #[error("Schema violation: {0}")]
    Contract(#[from] SchemaViolation),

    #[error("Gave up after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl DecisionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            DecisionError::Upstream(e) => e.is_retryable(),
            DecisionError::Contract(_) => true,
            DecisionError::Prompt(_) | DecisionError::Exhausted { .. } => false,
        }
    }
}

/// One way of deciding on an action
pub trait DecisionStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn decide(&self, bundle: &RiskBundle) -> Result<ActionRecord, DecisionError>;
}

/// Asks the reasoning service, retrying transient and contract failures
pub struct ModelStrategy<S> {
    service: S,
    config: ArbiterConfig,
}

impl<S: ReasoningService> ModelStrategy<S> {
    pub fn new(service: S, config: ArbiterConfig) -> Self {
        Self { service, config }
    }

    fn attempt(&self, prompt: &str) -> Result<ActionRecord, DecisionError> {
        let raw = self.service.generate(prompt)?;
        Ok(parse_model_response(&raw)?)
    }
}

impl<S: ReasoningService> DecisionStrategy for ModelStrategy<S> {
    fn name(&self) -> &'static str {
        "model"
    }

    fn decide(&self, bundle: &RiskBundle) -> Result<ActionRecord, DecisionError> {
        let prompt = build_prompt(bundle).map_err(|e| DecisionError::Prompt(e.to_string()))?;
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            match self.attempt(&prompt) {
                Ok(record) => {
                    debug!(attempt = attempt + 1, action = %record.action, "Model decision accepted");
                    return Ok(record);
                }
                Err(err) if !err.is_retryable() => {
                    warn!(attempt = attempt + 1, error = %err, "Reasoning failed, not retrying");
                    return Err(err);
                }
                Err(err) => {
                    last_error = err.to_string();
                    if attempt + 1 < max_attempts {
                        let backoff = self.config.backoff_after(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %err,
                            "Reasoning attempt failed, backing off"
                        );
                        thread::sleep(backoff);
                    } else {
                        warn!(attempt = attempt + 1, max_attempts, error = %err, "Final reasoning attempt failed");
                    }
                }
            }
        }

        Err(DecisionError::Exhausted {
            attempts: max_attempts,
            last: last_error,
        })
    }
}

/// Deterministic policy used when every other strategy fails
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    /// Fixed WARN record
    SafeDefault,
    /// Priority-ordered threshold rules
    Rules(RuleTable),
}

impl Default for Fallback {
    fn default() -> Self {
        Fallback::Rules(RuleTable::default())
    }
}

impl Fallback {
    pub fn from_config(config: &FallbackConfig) -> Self {
        match config.mode {
            FallbackMode::SafeDefault => Fallback::SafeDefault,
            FallbackMode::RuleTable => Fallback::Rules(RuleTable::new(config.rules.clone())),
        }
    }

    /// Total: always yields a RULE_FALLBACK record
    pub fn evaluate(&self, bundle: &RiskBundle) -> ActionRecord {
        match self {
            Fallback::SafeDefault => safe_default(),
            Fallback::Rules(table) => table.evaluate(bundle),
        }
    }
}

impl DecisionStrategy for Fallback {
    fn name(&self) -> &'static str {
        match self {
            Fallback::SafeDefault => "safe_default",
            Fallback::Rules(_) => "rule_table",
        }
    }

    fn decide(&self, bundle: &RiskBundle) -> Result<ActionRecord, DecisionError> {
        Ok(self.evaluate(bundle))
    }
}

/// Process-lifetime decision counters
#[derive(Debug, Default)]
pub struct ArbiterStats {
    decisions: AtomicU64,
    model_decisions: AtomicU64,
    fallback_decisions: AtomicU64,
    strategy_failures: AtomicU64,
}

/// Point-in-time copy of [`ArbiterStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub decisions: u64,
    pub model_decisions: u64,
    pub fallback_decisions: u64,
    pub strategy_failures: u64,
}

impl ArbiterStats {
    fn record(&self, source: DecisionSource) {
        self.decisions.fetch_add(1, Ordering::Relaxed);
        match source {
            DecisionSource::Model => self.model_decisions.fetch_add(1, Ordering::Relaxed),
            DecisionSource::RuleFallback => {
                self.fallback_decisions.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            decisions: self.decisions.load(Ordering::Relaxed),
            model_decisions: self.model_decisions.load(Ordering::Relaxed),
            fallback_decisions: self.fallback_decisions.load(Ordering::Relaxed),
            strategy_failures: self.strategy_failures.load(Ordering::Relaxed),
        }
    }
}

/// Chooses one action per bundle, never failing
pub struct DecisionArbiter {
    strategies: Vec<Box<dyn DecisionStrategy>>,
    fallback: Fallback,
    stats: ArbiterStats,
}

impl Default for DecisionArbiter {
    fn default() -> Self {
        Self::offline(Fallback::default())
    }
}

impl DecisionArbiter {
    /// Arbiter with no remote strategy: every decision comes from the fallback
    pub fn offline(fallback: Fallback) -> Self {
        Self {
            strategies: Vec::new(),
            fallback,
            stats: ArbiterStats::default(),
        }
    }

    /// Arbiter that consults the given service first
    pub fn with_service<S>(service: S, arbiter: ArbiterConfig, fallback: &FallbackConfig) -> Self
    where
        S: ReasoningService + 'static,
    {
        Self::offline(Fallback::from_config(fallback))
            .with_strategy(ModelStrategy::new(service, arbiter))
    }

    /// Append a strategy, tried after those already registered
    pub fn with_strategy(mut self, strategy: impl DecisionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Decide on one action. Always returns a schema-valid record.
    pub fn decide(&self, bundle: &RiskBundle) -> ActionRecord {
        for strategy in &self.strategies {
            match strategy.decide(bundle) {
                Ok(record) if is_schema_valid(&record) => {
                    return self.accept(strategy.name(), record);
                }
                Ok(record) => {
                    self.stats.strategy_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        strategy = strategy.name(),
                        confidence = record.confidence,
                        "Strategy returned an invalid record, trying next"
                    );
                }
                Err(err) => {
                    self.stats.strategy_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(strategy = strategy.name(), error = %err, "Strategy failed, trying next");
                }
            }
        }

        self.accept(self.fallback.name(), self.fallback.evaluate(bundle))
    }

    fn accept(&self, strategy: &'static str, record: ActionRecord) -> ActionRecord {
        self.stats.record(record.source);
        info!(
            strategy,
            action = %record.action,
            urgency = record.urgency.as_str(),
            source = record.source.as_str(),
            "Decision made"
        );
        record
    }
}

fn is_schema_valid(record: &ActionRecord) -> bool {
    (0.0..=1.0).contains(&record.confidence) && !record.notification_message.trim().is_empty()
}
