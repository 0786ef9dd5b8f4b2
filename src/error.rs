use thiserror::Error;
use crate::models::{ErrorResponse, ParseEnumError};
use crate::services::{CacheError, NotifyError, StoreError};

/// Errors surfaced by the matching operations
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl MatchError {
    /// HTTP status the outer routing layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            MatchError::NotFound(_) => 404,
            MatchError::Forbidden(_) => 403,
            MatchError::Conflict(_) => 409,
            MatchError::Validation(_) => 400,
            MatchError::Store(StoreError::Unavailable(_)) => 503,
            MatchError::Store(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::NotFound(_) => "not_found",
            MatchError::Forbidden(_) => "forbidden",
            MatchError::Conflict(_) => "conflict",
            MatchError::Validation(_) => "validation_failed",
            MatchError::Store(_) => "internal_error",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: self.status_code(),
        }
    }
}

impl From<validator::ValidationErrors> for MatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MatchError::Validation(errors.to_string())
    }
}

impl From<ParseEnumError> for MatchError {
    fn from(error: ParseEnumError) -> Self {
        MatchError::Validation(error.to_string())
    }
}

/// Errors raised while wiring the service together
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Notifier error: {0}")]
    Notifier(#[from] NotifyError),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}
