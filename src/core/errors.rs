//! Error types for the ccstokener-rs library.
//!
//! Structured error types that preserve context and follow a simple
//! propagation policy: errors with a well-defined skip unit (one token
//! file, one block, one report line) are recovered at the call site and
//! logged; errors with no safe skip unit abort the run.

use std::io;

use thiserror::Error;

/// Main result type for ccstokener operations.
pub type Result<T> = std::result::Result<T, CcsError>;

/// Comprehensive error type for all ccstokener operations.
#[derive(Error, Debug)]
pub enum CcsError {
    /// I/O related errors (file operations, directory creation)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Token-record input format errors
    #[error("Input format error in {path}: {message}")]
    InputFormat {
        /// Token-record file that failed to parse
        path: String,
        /// Error description
        message: String,
    },

    /// Detection pipeline errors
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Validation errors for configuration values
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
    },
}

impl CcsError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new input-format error
    pub fn input_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<io::Error> for CcsError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}
