use crate::error::AppError;
use crate::state::{AppState, Estimate, Observation, ReorderStatus};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

pub mod end_to_end;
pub mod model;
pub mod pairwise_mean;
pub mod policy;
pub mod projection;

use end_to_end::EndToEndModel;
use model::RateModel;
use pairwise_mean::PairwiseMeanModel;
use policy::Policy;
use projection::project_reorder;

pub const PAIRWISE_MEAN: &str = "pairwise_mean";
pub const END_TO_END: &str = "end_to_end";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown rate method: {0}")]
    UnknownMethod(String),
}

// Model Factory
pub fn create_rate_model(name: &str) -> Result<Box<dyn RateModel>, ModelError> {
    match name {
        PAIRWISE_MEAN => Ok(Box::new(PairwiseMeanModel)),
        END_TO_END => Ok(Box::new(EndToEndModel)),
        other => Err(ModelError::UnknownMethod(other.to_string())),
    }
}

/// Average daily consumption using the default pairwise-mean model.
///
/// Returns `0.0` when fewer than two valid readings exist or no pair shows a
/// drop in level.
pub fn estimate_rate(observations: &[Observation]) -> f64 {
    PairwiseMeanModel.estimate(observations).rate_per_day()
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn run_estimation(state: &Arc<RwLock<AppState>>) -> Result<Option<Estimate>, AppError> {
    run_estimation_at(state, today_utc(), SystemTime::now())
}

/// Recomputes the estimate under the state write lock.
pub fn run_estimation_at(
    state: &Arc<RwLock<AppState>>,
    today: Date,
    timestamp: SystemTime,
) -> Result<Option<Estimate>, AppError> {
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    Ok(recompute(&mut guard, today, timestamp))
}

/// Recomputes the estimate from the recorded readings and stores it.
///
/// Takes the state mutably so callers that just changed the log can refresh
/// the estimate inside the same critical section. The most recent valid
/// reading is the current level. Returns `None` and clears the stored
/// estimate when no valid reading exists.
pub fn recompute(state: &mut AppState, today: Date, timestamp: SystemTime) -> Option<Estimate> {
    let estimate = compute_estimate(
        state.observations().as_slice(),
        state.policy(),
        state.model().as_ref(),
        today,
        timestamp,
    );
    state.set_estimate(estimate.clone());
    estimate
}

fn compute_estimate(
    observations: &[Observation],
    policy: &Policy,
    model: &dyn RateModel,
    today: Date,
    timestamp: SystemTime,
) -> Option<Estimate> {
    let Some(latest) = observations
        .iter()
        .filter(|observation| observation.is_valid())
        .max_by_key(|observation| observation.timestamp)
        .copied()
    else {
        warn!("No valid observations available for consumption estimation");
        return None;
    };

    let rate = model.estimate(observations);
    if rate.is_insufficient() {
        warn!(
            count = observations.len(),
            method = model.name(),
            "Insufficient data for consumption rate estimation"
        );
    }

    let result = project_reorder(latest.level, rate.rate_per_day(), policy, today);
    match result.status {
        ReorderStatus::Critical => warn!(
            current_level = latest.level,
            min_level = policy.min_level,
            "Tank level requires an immediate order"
        ),
        ReorderStatus::Warning => info!(
            days_until_order = ?result.days_until_order,
            "Order due soon"
        ),
        ReorderStatus::Normal => {}
    }

    Some(Estimate {
        rate,
        rate_method: model.name(),
        current_level: latest.level,
        result,
        computed_on: today,
        timestamp,
    })
}
