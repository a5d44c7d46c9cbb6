//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use order_flow::FlowError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order flow error outside a chat turn.
    Flow(FlowError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Flow(err) => flow_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn flow_error_to_response(err: FlowError) -> (StatusCode, String) {
    match &err {
        FlowError::AuthenticationRequired => (StatusCode::UNAUTHORIZED, err.to_string()),
        FlowError::InvalidTransition { .. }
        | FlowError::Persistence(StoreError::VersionConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        FlowError::Persistence(StoreError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        FlowError::Persistence(_) | FlowError::Internal(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        _ => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        ApiError::Flow(err)
    }
}
