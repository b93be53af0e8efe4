//! Error types for the Babble session layer.
//!
//! Three families live here:
//! - [`BabbleError`] for configuration failures outside a session,
//! - [`ValidationError`] for input rejected before any remote call,
//! - [`ErrorInfo`], the record of a failed remote call kept in session state.

use std::path::PathBuf;

use babble_gateway::{RequestError, RequestErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::guard::OperationKind;

/// A specialized `Result` type for configuration and setup operations.
pub type Result<T> = std::result::Result<T, BabbleError>;

/// Errors that can occur while setting up a Babble session.
#[derive(Debug, thiserror::Error)]
pub enum BabbleError {
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your babble.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },
}

impl BabbleError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Input rejected before an operation is started.
///
/// The display text is the notice shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The speech issue description was empty or blank.
    #[error("Please enter a speech issue.")]
    EmptyIssue,
}

/// Record of the most recent failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Which operation failed.
    pub operation: OperationKind,
    /// How it failed.
    pub kind: RequestErrorKind,
    /// Message suitable for showing to the user.
    pub message: String,
    /// Technical description of the failure.
    pub detail: String,
    /// Whether retrying the same operation may succeed.
    #[serde(default)]
    pub retryable: bool,
    /// When the failure was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    /// Builds the record for a failed `operation`.
    #[must_use]
    pub fn from_request_error(operation: OperationKind, error: &RequestError) -> Self {
        Self {
            operation,
            kind: error.kind(),
            message: operation.failure_message().to_string(),
            detail: error.to_string(),
            retryable: error.is_transient(),
            occurred_at: Utc::now(),
        }
    }
}
