//! SleepGuard - Sleep-disruption risk estimation and intervention arbitration
//!
//! SleepGuard turns one phone sensor reading into one recommended intervention
//! through a deterministic pipeline: reading validation → risk estimation →
//! decision arbitration (remote reasoning with a rule-table fallback) →
//! action-value materialization.
//!
//! ## Modules
//!
//! - **Risk Estimator**: pure transfer functions from raw readings to a bounded risk bundle
//! - **Decision Arbiter**: model strategy with retries, ending at a total fallback
//! - **Materializer**: the executable payload for the chosen action

pub mod config;
pub mod decision;
pub mod error;
pub mod ledger;
pub mod materialize;
pub mod pipeline;
pub mod prompt;
pub mod reasoning;
pub mod response;
pub mod risk;
pub mod rules;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::Config;
pub use decision::{DecisionArbiter, DecisionStrategy, Fallback};
pub use error::ComputeError;
pub use ledger::SleepDebtLedger;
pub use pipeline::{reading_to_action, reading_to_risk, Assessment, SleepGuard};
pub use reasoning::{GeminiClient, ReasoningError, ReasoningService};
pub use risk::RiskEstimator;

// Schema exports
pub use schema::{RawReading, ReadingAdapter, ReadingPayload};

// Output exports
pub use types::{Action, ActionRecord, ActionValue, DecisionSource, RiskBundle, Urgency};

/// SleepGuard version reported by the CLI and FFI
pub const SLEEPGUARD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and FFI
pub const PRODUCER_NAME: &str = "sleepguard";
