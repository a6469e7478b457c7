//! Error handling module
//!
//! Centralized error types and HTTP response conversion (spec.md §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::ingest::IngestError;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// Application error types, one variant per spec.md §7 taxonomy entry.
/// `Conflict` is intentionally absent: it is resolved internally (idempotency
/// replay, bulk-insert duplicates) and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing or invalid X-User-Id header")]
    Unauthenticated,

    #[error("asserted identity does not match the request subject")]
    Forbidden,

    #[error("actor_id must match the asserted caller identity")]
    ActorMismatch,

    #[error(transparent)]
    InvalidArgument(#[from] DomainError),

    #[error("unknown {field}: {value}")]
    NotFound { field: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::ActorMismatch => AppError::ActorMismatch,
            IngestError::InvalidArgument(e) => AppError::InvalidArgument(e),
            IngestError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<crate::feed::reader::FeedReadError> for AppError {
    fn from(err: crate::feed::reader::FeedReadError) -> Self {
        match err {
            crate::feed::reader::FeedReadError::Domain(e) => AppError::InvalidArgument(e),
            crate::feed::reader::FeedReadError::Store(e) => AppError::Store(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated", None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::ActorMismatch => (StatusCode::BAD_REQUEST, "actor_mismatch", None),
            AppError::InvalidArgument(e) => {
                (StatusCode::BAD_REQUEST, "invalid_argument", Some(e.to_string()))
            }
            AppError::NotFound { field, value } => (
                StatusCode::BAD_REQUEST,
                "not_found",
                Some(format!("unknown {field}: {value}")),
            ),
            AppError::Store(e) => {
                tracing::error!(error = %e, "store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "config error");
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
