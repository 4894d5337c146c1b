use crate::api::responses::{
    ApiErrorCode, ErrorResponse, EstimateSuccessResponse, HealthStatus, HealthSuccessResponse,
    ObservationResponse, ObservationsSuccessResponse, RawLevel, RecordObservationRequest,
    RecordSuccessResponse, RemoveSuccessResponse,
};
use crate::estimation::{recompute, today_utc};
use crate::input::{self, InputError};
use crate::state::{AppState, Estimate, Observation, RecordOutcome};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use tracing::{error, info, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub type SharedState = Arc<RwLock<AppState>>;

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success { status: StatusCode, body: T },
    Error { status: StatusCode, body: ErrorResponse },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(state): State<SharedState>) -> impl IntoResponse {
    build_health_response(state, SystemTime::now())
}

pub async fn get_observations(State(state): State<SharedState>) -> impl IntoResponse {
    build_observations_response(state, SystemTime::now())
}

pub async fn post_observation(
    State(state): State<SharedState>,
    Json(request): Json<RecordObservationRequest>,
) -> impl IntoResponse {
    build_record_response(state, request, today_utc(), SystemTime::now())
}

pub async fn delete_last_observation(State(state): State<SharedState>) -> impl IntoResponse {
    build_remove_last_response(state, today_utc(), SystemTime::now())
}

pub async fn get_estimate(State(state): State<SharedState>) -> impl IntoResponse {
    build_estimate_response(state, SystemTime::now())
}

fn build_health_response(
    state: SharedState,
    now: SystemTime,
) -> ApiResponse<HealthSuccessResponse> {
    let observation_count = match state.read() {
        Ok(guard) => guard.observations().len(),
        Err(_) => return internal_error("/api/health", "state lock poisoned"),
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success {
            status: StatusCode::OK,
            body: HealthSuccessResponse {
                status: HealthStatus::Ok,
                observation_count,
                timestamp,
            },
        },
        Err(_) => internal_error("/api/health", "timestamp formatting failure"),
    }
}

fn build_observations_response(
    state: SharedState,
    now: SystemTime,
) -> ApiResponse<ObservationsSuccessResponse> {
    let (observations, capacity) = match state.read() {
        Ok(guard) => (
            guard.observations().as_slice().to_vec(),
            guard.observations().capacity(),
        ),
        Err(_) => return internal_error("/api/observations", "state lock poisoned"),
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success {
            status: StatusCode::OK,
            body: ObservationsSuccessResponse {
                observations: observations.iter().map(map_observation).collect(),
                capacity,
                timestamp,
            },
        },
        Err(_) => internal_error("/api/observations", "timestamp formatting failure"),
    }
}

fn build_record_response(
    state: SharedState,
    request: RecordObservationRequest,
    today: Date,
    now: SystemTime,
) -> ApiResponse<RecordSuccessResponse> {
    let observation = match parse_request(&request) {
        Ok(observation) => observation,
        Err(err) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorCode::InvalidInput,
                err.to_string(),
                now,
            );
        }
    };

    // Recording and recomputing share one write guard so the stored estimate
    // always matches the log it was computed from.
    let (outcome, observation_count) = match state.write() {
        Ok(mut guard) => {
            let outcome = guard.observations_mut().record(observation);
            if outcome != RecordOutcome::TooOld {
                recompute(&mut guard, today, now);
            }
            (outcome, guard.observations().len())
        }
        Err(_) => return internal_error("/api/observations", "state lock poisoned"),
    };

    let (replaced, evicted) = match outcome {
        RecordOutcome::Added => (None, None),
        RecordOutcome::Replaced(previous) => (Some(map_observation(&previous)), None),
        RecordOutcome::Evicted(oldest) => (None, Some(map_observation(&oldest))),
        RecordOutcome::TooOld => {
            warn!(
                timestamp_ms = observation.timestamp,
                count = observation_count,
                "Rejected reading older than every stored entry in a full log"
            );
            return error_response(
                StatusCode::CONFLICT,
                ApiErrorCode::ObservationTooOld,
                format!(
                    "Reading for {} is older than every stored reading and the log is full",
                    request.date
                ),
                now,
            );
        }
    };
    info!(
        timestamp_ms = observation.timestamp,
        level = observation.level,
        count = observation_count,
        "Observation recorded"
    );

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success {
            status: StatusCode::CREATED,
            body: RecordSuccessResponse {
                observation: map_observation(&observation),
                replaced,
                evicted,
                observation_count,
                timestamp,
            },
        },
        Err(_) => internal_error("/api/observations", "timestamp formatting failure"),
    }
}

fn build_remove_last_response(
    state: SharedState,
    today: Date,
    now: SystemTime,
) -> ApiResponse<RemoveSuccessResponse> {
    let (removed, observation_count) = match state.write() {
        Ok(mut guard) => {
            let removed = guard.observations_mut().remove_last();
            if removed.is_some() {
                recompute(&mut guard, today, now);
            }
            (removed, guard.observations().len())
        }
        Err(_) => return internal_error("/api/observations/last", "state lock poisoned"),
    };

    let Some(removed) = removed else {
        return error_response(
            StatusCode::NOT_FOUND,
            ApiErrorCode::NoData,
            "No observations recorded".to_string(),
            now,
        );
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success {
            status: StatusCode::OK,
            body: RemoveSuccessResponse {
                removed: map_observation(&removed),
                observation_count,
                timestamp,
            },
        },
        Err(_) => internal_error("/api/observations/last", "timestamp formatting failure"),
    }
}

fn build_estimate_response(
    state: SharedState,
    now: SystemTime,
) -> ApiResponse<EstimateSuccessResponse> {
    let estimate = match state.read() {
        Ok(guard) => guard.estimate().cloned(),
        Err(_) => return internal_error("/api/estimate", "state lock poisoned"),
    };

    let Some(estimate) = estimate else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::NoData,
            "No estimate available".to_string(),
            now,
        );
    };

    match format_timestamp(estimate.timestamp) {
        Ok(timestamp) => ApiResponse::Success {
            status: StatusCode::OK,
            body: map_estimate(&estimate, timestamp),
        },
        Err(_) => internal_error("/api/estimate", "timestamp formatting failure"),
    }
}

fn parse_request(request: &RecordObservationRequest) -> Result<Observation, InputError> {
    let date = input::parse_date(&request.date)?;
    let level = match &request.level {
        RawLevel::Number(level) => input::check_level(*level)?,
        RawLevel::Text(raw) => input::parse_level(raw)?,
    };
    Ok(Observation::new(input::date_to_timestamp(date), level))
}

fn map_observation(observation: &Observation) -> ObservationResponse {
    ObservationResponse {
        date: input::timestamp_to_date(observation.timestamp).and_then(input::format_date),
        timestamp_ms: observation.timestamp,
        level: observation.level,
    }
}

fn map_estimate(estimate: &Estimate, timestamp: String) -> EstimateSuccessResponse {
    let result = &estimate.result;
    EstimateSuccessResponse {
        status: result.status,
        current_level: estimate.current_level,
        consumption_rate_per_day: result.consumption_rate_per_day,
        insufficient_data: estimate.rate.is_insufficient(),
        rate_method: estimate.rate_method.to_string(),
        days_until_min_level: Some(result.days_until_min_level).filter(|days| days.is_finite()),
        days_until_order: result.days_until_order,
        order_date: result.order_date.and_then(input::format_date),
        delivery_date: result.delivery_date.and_then(input::format_date),
        depletion_date: result.depletion_date.and_then(input::format_date),
        level_after_refill: result.level_after_refill,
        computed_on: input::format_date(estimate.computed_on),
        timestamp,
    }
}

fn error_response<T>(
    status: StatusCode,
    error_code: ApiErrorCode,
    error_message: String,
    now: SystemTime,
) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status,
            body: ErrorResponse {
                error_code,
                error_message,
                timestamp,
            },
        },
        Err(_) => internal_error("api", "timestamp formatting failure"),
    }
}

fn internal_error<T>(endpoint: &str, message: &str) -> ApiResponse<T> {
    error!(
        endpoint = endpoint,
        message = message,
        "Internal error while handling request"
    );
    let formatted = format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ApiErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
