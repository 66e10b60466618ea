//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, booking::BookingError};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::EmailTaken => ApiError::BadRequest(e.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidToken => ApiError::Unauthorized,
            AuthError::UserNotFound => ApiError::NotFound(e.to_string()),
            AuthError::Internal(msg) => {
                error!("Authentication failure: {}", msg);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::RoomNotFound => ApiError::NotFound(e.to_string()),
            BookingError::AlreadyBooked | BookingError::BookingNotFound => {
                ApiError::BadRequest(e.to_string())
            }
            BookingError::Forbidden => ApiError::Forbidden(e.to_string()),
            BookingError::KeyServiceUnavailable(_)
            | BookingError::KeyServiceProtocol(_)
            | BookingError::Store(_) => {
                error!("Booking failure: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
