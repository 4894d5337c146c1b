//! Consumption-rate model trait.
//!
//! A rate model turns a series of tank-level readings into an average daily
//! consumption rate. Models are selected by name from `[estimation].rate_method`.

use crate::state::Observation;

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Outcome of a rate estimation.
///
/// `InsufficientData` is distinct from a measured rate so callers can render a
/// neutral message instead of treating the tank as idle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateEstimate {
    Measured {
        /// Percentage points consumed per day, always positive.
        rate_per_day: f64,
        /// Number of reading pairs that contributed to the rate.
        pairs: usize,
    },
    InsufficientData,
}

impl RateEstimate {
    /// Rate in percent per day, `0.0` when there is not enough data.
    pub fn rate_per_day(&self) -> f64 {
        match self {
            Self::Measured { rate_per_day, .. } => *rate_per_day,
            Self::InsufficientData => 0.0,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientData)
    }

    /// Wraps a computed rate, degrading non-positive or non-finite values.
    pub(crate) fn from_rate(rate_per_day: f64, pairs: usize) -> Self {
        if rate_per_day.is_finite() && rate_per_day > 0.0 && pairs > 0 {
            Self::Measured {
                rate_per_day,
                pairs,
            }
        } else {
            Self::InsufficientData
        }
    }
}

/// Trait for consumption-rate models.
pub trait RateModel: Send + Sync + std::fmt::Debug {
    /// Name used to select the model in configuration.
    fn name(&self) -> &'static str;

    /// Estimate the daily consumption rate from raw readings.
    ///
    /// Readings may arrive unsorted and may contain invalid levels; models are
    /// expected to run them through [`prepare_observations`] first.
    fn estimate(&self, observations: &[Observation]) -> RateEstimate;
}

/// Drops invalid levels, sorts ascending by timestamp and removes duplicate
/// timestamps (the first reading at a timestamp wins).
pub fn prepare_observations(observations: &[Observation]) -> Vec<Observation> {
    let mut prepared: Vec<Observation> = observations
        .iter()
        .filter(|observation| observation.is_valid())
        .copied()
        .collect();
    prepared.sort_by_key(|observation| observation.timestamp);
    prepared.dedup_by_key(|observation| observation.timestamp);
    prepared
}

/// Elapsed time between two readings in fractional days.
///
/// Computed in `f64` so any pair of `i64` timestamps is accepted.
pub fn day_gap(earlier: &Observation, later: &Observation) -> f64 {
    (later.timestamp as f64 - earlier.timestamp as f64) / MILLIS_PER_DAY
}
