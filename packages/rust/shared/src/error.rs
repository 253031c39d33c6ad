//! Error types for compdef.
//!
//! Every crate in the workspace returns [`CompdefError`] via `thiserror`.
//! Collaborator implementations report their own failures through the
//! per-service variants; the coordinator passes them through unchanged.

use std::path::PathBuf;

/// Top-level error type for all compdef operations.
#[derive(Debug, thiserror::Error)]
pub enum CompdefError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// No stored value exists for the given key.
    #[error("not found: {key}")]
    NotFound { key: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding of a definition failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Harvest service failure (including "nothing harvested").
    #[error("harvest error: {0}")]
    Harvest(String),

    /// Summary service failure.
    #[error("summary error: {0}")]
    Summary(String),

    /// Aggregation service failure.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// Curation lookup or application failure.
    #[error("curation error: {0}")]
    Curation(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed input (coordinate text, config values, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CompdefError>;

impl CompdefError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a not-found error for the given key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "no such entry" rather than a backend failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CompdefError::config("concurrency must be at least 1");
        assert_eq!(err.to_string(), "config error: concurrency must be at least 1");

        let err = CompdefError::not_found("npm/npmjs/-/lodash/4.17.21/definition/1");
        assert!(err.to_string().contains("lodash/4.17.21"));

        let err = CompdefError::Harvest("nothing harvested".into());
        assert_eq!(err.to_string(), "harvest error: nothing harvested");
    }

    #[test]
    fn not_found_is_distinguished() {
        assert!(CompdefError::not_found("k").is_not_found());
        assert!(!CompdefError::Storage("connection reset".into()).is_not_found());
        assert!(!CompdefError::validation("bad").is_not_found());
    }
}
