use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::ride::RideStatus;

#[derive(Debug, Error)]
pub enum RideError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: RideStatus, to: RideStatus },

    #[error("transition lost a concurrent commit, retry")]
    ConcurrencyConflict,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for RideError {
    fn into_response(self) -> Response {
        let status = match &self {
            RideError::InvalidCoordinate(_) | RideError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RideError::PriceUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RideError::NotFound(_) => StatusCode::NOT_FOUND,
            RideError::Forbidden(_) => StatusCode::FORBIDDEN,
            RideError::InvalidTransition { .. }
            | RideError::ConcurrencyConflict
            | RideError::Conflict(_) => StatusCode::CONFLICT,
            RideError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RideError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
