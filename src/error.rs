//! Error types for abtest-store
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// abtest-store error types
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced experiment does not exist in the registry
    #[error("Experiment not found: {0}")]
    NotFound(String),

    /// Malformed or semantically invalid input (rejected before any mutation)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Store configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON request body or config could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status a consuming route layer should answer with.
    ///
    /// The store has no notion of HTTP; this is an integration hint only.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidArgument(_) | Self::Json(_) => 400,
            Self::Config(_) => 500,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::NotFound("x".into()).status_code(), 404);
        assert_eq!(Error::invalid("bad").status_code(), 400);
        assert_eq!(Error::Config("bad".into()).status_code(), 500);
    }
}
