//! Error types for the controller

use thiserror::Error;

/// Result type alias for the controller
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Main error type for the controller
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Redis errors
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The detector could not seed its rolling window
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The stats payload has no group for the required outcome
    #[error("No series with {0} outcome")]
    MissingOutcome(String),

    /// Upstream API answered with a non-success status other than 429
    #[error("Upstream error: HTTP {status} on {url}")]
    Upstream { status: u16, url: String },

    /// Operator input rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parsing errors
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper functions for creating specific errors
impl ControllerError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn insufficient_data<S: Into<String>>(message: S) -> Self {
        Self::InsufficientData(message.into())
    }

    pub fn missing_outcome<S: Into<String>>(outcome: S) -> Self {
        Self::MissingOutcome(outcome.into())
    }

    pub fn upstream<S: Into<String>>(status: u16, url: S) -> Self {
        Self::Upstream {
            status,
            url: url.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn parsing<S: Into<String>>(message: S) -> Self {
        Self::Parsing(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Errors that abort a single detection run without touching state
    pub fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData(_) | Self::MissingOutcome(_) | Self::Parsing(_)
        )
    }
}
