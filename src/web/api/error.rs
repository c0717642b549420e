use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::elements::FetchError;
use crate::observations::ObservationError;
use crate::predict::PredictError;

pub enum ApiError {
    Fetch(FetchError),
    Predict(PredictError),
    Observation(ObservationError),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::Fetch(e)
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        ApiError::Predict(e)
    }
}

impl From<ObservationError> for ApiError {
    fn from(e: ObservationError) -> Self {
        ApiError::Observation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Fetch(e) if e.is_data_error() => {
                (StatusCode::BAD_GATEWAY, "catalog_data_invalid", e.to_string())
            }
            ApiError::Fetch(e) => (StatusCode::SERVICE_UNAVAILABLE, "catalog_unreachable", e.to_string()),
            ApiError::Predict(e @ PredictError::PropagatorUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "propagator_unavailable", e.to_string())
            }
            ApiError::Predict(e @ PredictError::Propagation(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "propagation_failed", e.to_string())
            }
            ApiError::Predict(e) => (StatusCode::BAD_REQUEST, "validation_failed", e.to_string()),
            ApiError::Observation(e @ ObservationError::UnknownPass(_)) => {
                (StatusCode::NOT_FOUND, "pass_not_found", e.to_string())
            }
            ApiError::Observation(e @ ObservationError::InvalidAltitude(_)) => {
                (StatusCode::BAD_REQUEST, "validation_failed", e.to_string())
            }
            ApiError::Observation(e) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e.to_string()),
        };
        (status, Json(ErrorResponse::with_message(error, &message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
