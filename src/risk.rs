//! Risk estimation
//!
//! This module turns a validated sensor reading into a bounded risk bundle:
//! - Residual caffeine via first-order exponential clearance
//! - Melatonin suppression from screen time amplified by brightness
//! - Noise disruption as a piecewise-linear curve in decibels
//! - Sleep-debt risk as a categorical step function
//! - Time pressure as the wake deadline approaches
//!
//! Everything here is pure: no I/O, no state beyond the input.

use crate::config::EstimatorConfig;
use crate::error::ComputeError;
use crate::schema::{CaffeineIntake, RawReading};
use crate::types::{BundleContext, RiskBundle};
use chrono::{DateTime, FixedOffset};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Estimator for computing risk bundles
#[derive(Debug, Clone, Default)]
pub struct RiskEstimator {
    config: EstimatorConfig,
}

impl RiskEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Validate the reading and compute its risk bundle
    pub fn estimate(&self, reading: &RawReading) -> Result<RiskBundle, ComputeError> {
        reading.validate()?;

        let cfg = &self.config;
        let remaining_caffeine_mg =
            caffeine_remaining(&reading.caffeine_log, reading.current_time, cfg);
        let melatonin_suppression_risk =
            melatonin_risk(reading.screen_minutes, reading.brightness, cfg);
        let noise_disruption_risk = noise_risk(reading.noise_db, cfg);
        let sleep_debt_risk = sleep_debt_risk(reading.sleep_debt_hours, cfg);

        let hours_to_target = reading
            .next_alarm
            .map(|alarm| hours_between(reading.current_time, alarm));
        let time_pressure_risk = hours_to_target.map(|h| time_pressure_risk(h, cfg));

        Ok(RiskBundle {
            remaining_caffeine_mg,
            melatonin_suppression_risk,
            noise_disruption_risk,
            sleep_debt_hours: reading.sleep_debt_hours,
            sleep_debt_risk,
            time_to_target_sleep: hours_to_target.map(|h| round_to(h, 1)),
            time_pressure_risk,
            current_time: Some(reading.current_time),
            next_alarm: reading.next_alarm,
            context: BundleContext {
                sleep_goal_hours: reading.sleep_goal_hours,
                recent_actions: reading.recent_actions.clone(),
            },
        })
    }
}

/// Estimate with the default constants
pub fn estimate(reading: &RawReading) -> Result<RiskBundle, ComputeError> {
    RiskEstimator::default().estimate(reading)
}

/// Total caffeine still circulating at `now` (mg, 1 decimal)
///
/// Each intake decays as `dose * 0.5^(t / half_life)`; intakes older than the
/// window contribute nothing.
pub fn caffeine_remaining(
    log: &[CaffeineIntake],
    now: DateTime<FixedOffset>,
    cfg: &EstimatorConfig,
) -> f64 {
    let total: f64 = log
        .iter()
        .map(|intake| (intake.amount_mg, hours_between(intake.taken_at, now)))
        .filter(|&(_, elapsed)| elapsed <= cfg.caffeine_window_hours)
        .map(|(dose, elapsed)| dose * 0.5_f64.powf(elapsed / cfg.caffeine_half_life_hours))
        .sum();
    round_to(total, 1)
}

/// Screen-exposure melatonin suppression risk (0-1, 2 decimals)
pub fn melatonin_risk(screen_minutes: f64, brightness: f64, cfg: &EstimatorConfig) -> f64 {
    let base = (screen_minutes / cfg.screen_threshold_minutes).min(1.0);
    let factor = 1.0 + brightness * cfg.brightness_gain;
    round_to((base * factor).clamp(0.0, 1.0), 2)
}

/// Ambient noise disruption risk (0-1, 2 decimals)
///
/// Zero below the quiet level, a linear ramp up to the loud level, then a
/// slower tail starting at the tail floor and capped at 1.
pub fn noise_risk(noise_db: f64, cfg: &EstimatorConfig) -> f64 {
    let risk = if noise_db < cfg.noise_quiet_db {
        0.0
    } else if noise_db < cfg.noise_loud_db {
        (noise_db - cfg.noise_quiet_db) / cfg.noise_ramp_divisor
    } else {
        cfg.noise_tail_floor
            + (noise_db - cfg.noise_loud_db) / cfg.noise_tail_span_db * cfg.noise_tail_gain
    };
    round_to(risk.clamp(0.0, 1.0), 2)
}

/// Categorical sleep-debt risk
pub fn sleep_debt_risk(sleep_debt_hours: f64, cfg: &EstimatorConfig) -> f64 {
    if sleep_debt_hours < cfg.debt_moderate_hours {
        cfg.debt_low_risk
    } else if sleep_debt_hours < cfg.debt_severe_hours {
        cfg.debt_moderate_risk
    } else {
        cfg.debt_severe_risk
    }
}

/// Deadline pressure (0-1, 2 decimals): zero outside the window, rising
/// linearly to 1 at the wake instant
///
/// An alarm already in the past saturates at 1 rather than growing past it.
pub fn time_pressure_risk(hours_to_target: f64, cfg: &EstimatorConfig) -> f64 {
    let window = cfg.time_pressure_window_hours;
    round_to(((window - hours_to_target) / window).clamp(0.0, 1.0), 2)
}

fn hours_between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
