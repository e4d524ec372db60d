//! Error types for the word search service.
//!
//! Library crates use [`WordSearchError`] via `thiserror`.
//! The binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all word search operations.
#[derive(Debug, thiserror::Error)]
pub enum WordSearchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to the lookup service or the model provider.
    #[error("network error: {0}")]
    Network(String),

    /// The text-generation capability failed or returned nothing usable.
    #[error("generation error: {0}")]
    Generation(String),

    /// A response could not be parsed into the expected structure.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// No search attempt produced page content.
    #[error("no content found for '{query}'")]
    ContentNotFound { query: String },

    /// Research finished without a single usable target term.
    #[error("no terms found for topic '{topic}'")]
    NoTermsFound { topic: String },

    /// The session id is unknown, expired, or already consumed.
    #[error("game session '{0}' not found")]
    SessionNotFound(String),

    /// Request or data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// An external call exceeded its time budget.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WordSearchError>;

impl WordSearchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
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

    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config_error",
            Self::Network(_) => "network_error",
            Self::Generation(_) => "generation_failure",
            Self::Parse { .. } => "parse_failure",
            Self::ContentNotFound { .. } => "content_not_found",
            Self::NoTermsFound { .. } => "no_terms_found",
            Self::SessionNotFound(_) => "session_not_found",
            Self::Validation { .. } => "validation_error",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io_error",
        }
    }
}
