use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Deduction refused because it would push a scheme past its annual limit.
    #[error("Scheme {scheme_id} capacity exceeded: requested {requested}, remaining {remaining}")]
    CapacityExceeded {
        scheme_id: Uuid,
        requested: Decimal,
        remaining: Decimal,
    },

    /// A data row and its audit row could not be committed together.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoverageError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

pub type CoverageResult<T> = Result<T, CoverageError>;
