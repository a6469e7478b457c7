//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors independent of the web/infrastructure layer.
///
/// Every variant here is client-caused (bad input) — the core's internal
/// conflicts (idempotency replay, fan-out duplicates) are resolved without
/// ever surfacing as an error (spec §7).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("field '{field}' must be positive")]
    NotPositive { field: &'static str },

    #[error("field '{field}' exceeds max length {max} (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("field '{field}' must not be empty")]
    Empty { field: &'static str },

    #[error("cursor is invalid")]
    InvalidCursor,

    #[error("unknown analytics window: {0}")]
    UnknownWindow(String),

    #[error("unknown analytics dimension: {0}")]
    UnknownDimension(String),

    #[error("limit must be between {min} and {max}")]
    LimitOutOfRange { min: i64, max: i64 },
}

impl DomainError {
    pub fn is_client_error(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_positive_message() {
        let err = DomainError::NotPositive { field: "actor_id" };
        assert!(err.to_string().contains("actor_id"));
        assert!(err.is_client_error());
    }

    #[test]
    fn too_long_message() {
        let err = DomainError::TooLong {
            field: "verb",
            max: 64,
            actual: 70,
        };
        assert!(err.to_string().contains("64"));
        assert!(err.to_string().contains("70"));
    }
}
