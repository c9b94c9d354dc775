//! Error types for chatroom-rs.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported conversation kind: {0}")]
    UnsupportedKind(i16),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnsupportedKind(_) => "UNSUPPORTED_KIND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Config(_) | Self::Internal(_)
        )
    }

    /// Prefix the message with context while keeping the variant.
    #[must_use]
    pub fn context(self, ctx: &str) -> Self {
        match self {
            Self::NotFound(msg) => Self::NotFound(format!("{ctx}: {msg}")),
            Self::Forbidden(msg) => Self::Forbidden(format!("{ctx}: {msg}")),
            Self::Validation(msg) => Self::Validation(format!("{ctx}: {msg}")),
            Self::Database(msg) => Self::Database(format!("{ctx}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{ctx}: {msg}")),
            Self::Internal(msg) => Self::Internal(format!("{ctx}: {msg}")),
            kind @ Self::UnsupportedKind(_) => kind,
        }
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
