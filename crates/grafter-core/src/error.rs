//! Error types for the Grafter migration engine.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Grafter operations.
#[derive(Debug, Error)]
pub enum GrafterError {
    // Resolver errors
    #[error("Graph resolver unreachable: {message}")]
    Resolver {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Checkmk web API error: {message}")]
    WebApi {
        message: String,
        status_code: Option<u16>,
    },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("Datasource not found: {name}")]
    DatasourceNotFound { name: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Migration contract violations
    #[error("Key path conflict at {path}: intermediate value is not an object")]
    PathConflict { path: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Grafter operations.
pub type Result<T> = std::result::Result<T, GrafterError>;

// Conversion implementations for common error types

impl From<std::io::Error> for GrafterError {
    fn from(err: std::io::Error) -> Self {
        GrafterError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for GrafterError {
    fn from(err: serde_json::Error) -> Self {
        GrafterError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for GrafterError {
    fn from(err: rusqlite::Error) -> Self {
        GrafterError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for GrafterError {
    fn from(err: reqwest::Error) -> Self {
        GrafterError::Resolver {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl GrafterError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        GrafterError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True when the error means the graph resolver could not be consulted.
    ///
    /// Distinct from a resolver that answered with an empty recipe list,
    /// which is a legitimate "no graphs for this context" outcome.
    pub fn is_resolver_failure(&self) -> bool {
        matches!(
            self,
            GrafterError::Resolver { .. } | GrafterError::WebApi { .. }
        )
    }
}
