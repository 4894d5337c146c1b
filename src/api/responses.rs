use crate::state::ReorderStatus;
use serde::{Deserialize, Serialize};

/// Level as typed into a form: either a JSON number or raw text.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawLevel {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RecordObservationRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    pub level: RawLevel,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ObservationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub timestamp_ms: i64,
    pub level: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ObservationsSuccessResponse {
    pub observations: Vec<ObservationResponse>,
    pub capacity: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecordSuccessResponse {
    pub observation: ObservationResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<ObservationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted: Option<ObservationResponse>,
    pub observation_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoveSuccessResponse {
    pub removed: ObservationResponse,
    pub observation_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EstimateSuccessResponse {
    pub status: ReorderStatus,
    pub current_level: f64,
    pub consumption_rate_per_day: f64,
    pub insufficient_data: bool,
    pub rate_method: String,
    /// `null` when no consumption is measurable.
    pub days_until_min_level: Option<f64>,
    pub days_until_order: Option<i64>,
    pub order_date: Option<String>,
    pub delivery_date: Option<String>,
    pub depletion_date: Option<String>,
    pub level_after_refill: f64,
    pub computed_on: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub observation_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    NoData,
    InvalidInput,
    ObservationTooOld,
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ApiErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_accepts_numeric_or_text_level() {
        let numeric: RecordObservationRequest =
            serde_json::from_value(json!({ "date": "2026-01-10", "level": 72.5 }))
                .expect("numeric level");
        let text: RecordObservationRequest =
            serde_json::from_value(json!({ "date": "2026-01-10", "level": "72.5" }))
                .expect("text level");

        assert_eq!(numeric.level, RawLevel::Number(72.5));
        assert_eq!(text.level, RawLevel::Text("72.5".to_string()));
    }

    #[test]
    fn estimate_response_serializes_unbounded_values_as_null() {
        let response = EstimateSuccessResponse {
            status: ReorderStatus::Normal,
            current_level: 60.0,
            consumption_rate_per_day: 0.0,
            insufficient_data: true,
            rate_method: "pairwise_mean".to_string(),
            days_until_min_level: None,
            days_until_order: None,
            order_date: None,
            delivery_date: None,
            depletion_date: None,
            level_after_refill: 90.0,
            computed_on: Some("2026-01-10".to_string()),
            timestamp: "2026-01-10T08:00:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize estimate response");
        assert_eq!(
            value,
            json!({
                "status": "normal",
                "current_level": 60.0,
                "consumption_rate_per_day": 0.0,
                "insufficient_data": true,
                "rate_method": "pairwise_mean",
                "days_until_min_level": null,
                "days_until_order": null,
                "order_date": null,
                "delivery_date": null,
                "depletion_date": null,
                "level_after_refill": 90.0,
                "computed_on": "2026-01-10",
                "timestamp": "2026-01-10T08:00:00Z"
            })
        );
    }

    #[test]
    fn record_response_omits_absent_replacement() {
        let response = RecordSuccessResponse {
            observation: ObservationResponse {
                date: Some("2026-01-10".to_string()),
                timestamp_ms: 1_768_003_200_000,
                level: 70.0,
            },
            replaced: None,
            evicted: None,
            observation_count: 3,
            timestamp: "2026-01-10T08:00:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize record response");
        assert_eq!(
            value,
            json!({
                "observation": {
                    "date": "2026-01-10",
                    "timestamp_ms": 1_768_003_200_000_i64,
                    "level": 70.0
                },
                "observation_count": 3,
                "timestamp": "2026-01-10T08:00:00Z"
            })
        );
    }

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ErrorResponse {
            error_code: ApiErrorCode::InvalidInput,
            error_message: "level 120 is outside 0..=100".to_string(),
            timestamp: "2026-01-10T08:00:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "INVALID_INPUT",
                "error_message": "level 120 is outside 0..=100",
                "timestamp": "2026-01-10T08:00:00Z"
            })
        );
    }

    #[test]
    fn backdated_reading_error_code_is_distinct() {
        let value = serde_json::to_value(ApiErrorCode::ObservationTooOld)
            .expect("serialize error code");
        assert_eq!(value, json!("OBSERVATION_TOO_OLD"));
    }

    #[test]
    fn health_response_serializes_status() {
        let response = HealthSuccessResponse {
            status: HealthStatus::Ok,
            observation_count: 0,
            timestamp: "2026-01-10T08:00:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize health response");
        assert_eq!(
            value,
            json!({
                "status": "ok",
                "observation_count": 0,
                "timestamp": "2026-01-10T08:00:00Z"
            })
        );
    }
}
