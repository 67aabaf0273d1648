//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid session/admin credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Login rejected. Covers both unknown username and wrong password so
    /// responses do not reveal which names are registered.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Validation failed - invalid input shape, rejected before any store
    /// access.
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Balance too low for the attempted purchase.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance of the relevant currency.
        balance: i64,
        /// Price that could not be covered.
        required: i64,
    },

    /// The data store failed or is unreachable. Retryable.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
                None,
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientFunds { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "The data store is temporarily unavailable".to_string(),
                    None,
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<crafthub_store::StoreError> for ApiError {
    fn from(err: crafthub_store::StoreError) -> Self {
        match err {
            crafthub_store::StoreError::NotFound => Self::NotFound("resource not found".into()),
            crafthub_store::StoreError::Conflict(msg) => Self::Conflict(msg),
            crafthub_store::StoreError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            crafthub_store::StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
        }
    }
}

impl From<crafthub_core::IdError> for ApiError {
    fn from(err: crafthub_core::IdError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<crafthub_core::DomainError> for ApiError {
    fn from(err: crafthub_core::DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}
