use crate::estimation::model::{RateEstimate, RateModel};
use crate::estimation::pairwise_mean::PairwiseMeanModel;
use crate::estimation::policy::Policy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;
use time::Date;
use tokio::sync::watch;

/// Default number of readings kept in the observation log.
pub const DEFAULT_MAX_OBSERVATIONS: usize = 14;

/// One manually entered tank-level reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Fill level in percent.
    pub level: f64,
}

impl Observation {
    pub fn new(timestamp: i64, level: f64) -> Self {
        Self { timestamp, level }
    }

    /// A reading is usable when its level is finite and within 0..=100.
    pub fn is_valid(&self) -> bool {
        self.level.is_finite() && (0.0..=100.0).contains(&self.level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimationResult {
    pub consumption_rate_per_day: f64,
    /// `f64::INFINITY` when no consumption is measurable.
    pub days_until_min_level: f64,
    /// Whole days until the order must be placed; `None` when unbounded.
    pub days_until_order: Option<i64>,
    pub order_date: Option<Date>,
    pub delivery_date: Option<Date>,
    pub depletion_date: Option<Date>,
    pub level_after_refill: f64,
    pub status: ReorderStatus,
}

impl EstimationResult {
    /// True when the tank never reaches the reorder floor at the current rate.
    pub fn is_unbounded(&self) -> bool {
        self.days_until_min_level.is_infinite()
    }
}

/// A projection together with the inputs it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub rate: RateEstimate,
    pub rate_method: &'static str,
    pub current_level: f64,
    pub result: EstimationResult,
    pub computed_on: Date,
    pub timestamp: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordOutcome {
    Added,
    /// An entry with the same timestamp was overwritten.
    Replaced(Observation),
    /// The log was full and its oldest entry was dropped.
    Evicted(Observation),
    /// The log is full and the reading predates every stored entry; nothing
    /// was recorded.
    TooOld,
}

/// Bounded, timestamp-ordered store of readings owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationLog {
    entries: Vec<Observation>,
    capacity: usize,
}

impl ObservationLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.entries
    }

    /// Most recent reading by timestamp.
    pub fn latest(&self) -> Option<&Observation> {
        self.entries.last()
    }

    pub fn record(&mut self, observation: Observation) -> RecordOutcome {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.timestamp == observation.timestamp)
        {
            let previous = *existing;
            *existing = observation;
            return RecordOutcome::Replaced(previous);
        }

        let full = self.entries.len() >= self.capacity;
        if full
            && self
                .entries
                .first()
                .is_some_and(|oldest| observation.timestamp < oldest.timestamp)
        {
            return RecordOutcome::TooOld;
        }

        let position = self
            .entries
            .partition_point(|entry| entry.timestamp < observation.timestamp);
        self.entries.insert(position, observation);

        if self.entries.len() > self.capacity {
            RecordOutcome::Evicted(self.entries.remove(0))
        } else {
            RecordOutcome::Added
        }
    }

    pub fn remove_last(&mut self) -> Option<Observation> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ObservationLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OBSERVATIONS)
    }
}

#[derive(Debug)]
pub struct AppState {
    observations: ObservationLog,
    policy: Policy,
    model: Arc<dyn RateModel>,
    estimate: Option<Estimate>,
    estimate_tx: watch::Sender<Option<Estimate>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(
            Policy::default(),
            Arc::new(PairwiseMeanModel),
            DEFAULT_MAX_OBSERVATIONS,
        )
    }

    pub fn with_settings(policy: Policy, model: Arc<dyn RateModel>, capacity: usize) -> Self {
        let (estimate_tx, _estimate_rx) = watch::channel(None);
        Self {
            observations: ObservationLog::new(capacity),
            policy,
            model,
            estimate: None,
            estimate_tx,
        }
    }

    pub fn observations(&self) -> &ObservationLog {
        &self.observations
    }

    pub fn observations_mut(&mut self) -> &mut ObservationLog {
        &mut self.observations
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn model(&self) -> &Arc<dyn RateModel> {
        &self.model
    }

    pub fn set_model(&mut self, model: Arc<dyn RateModel>) {
        self.model = model;
    }

    pub fn estimate(&self) -> Option<&Estimate> {
        self.estimate.as_ref()
    }

    pub fn subscribe_estimate(&self) -> watch::Receiver<Option<Estimate>> {
        self.estimate_tx.subscribe()
    }

    /// Stores the estimate and publishes it to subscribers.
    pub fn set_estimate(&mut self, estimate: Option<Estimate>) {
        self.estimate = estimate.clone();
        self.estimate_tx.send_replace(estimate);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
