//! Error types for calls to the lesson service.
//!
//! Every failed call is classified into one of three kinds so that the
//! session layer can record what went wrong without knowing about HTTP.

/// A specialized `Result` type for gateway operations.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Errors produced by a single remote call.
///
/// No variant is fatal: the caller surfaces the error and the user may
/// trigger the same operation again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The request never produced an HTTP response (connect, timeout, or body read failure).
    #[error("Network error: {message}\n\nSuggestion: Check that the lesson service is running and reachable")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("Server error ({status}): {message}\n\nSuggestion: {suggestion}")]
    Server {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message reported by the service, or the status reason.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The service answered successfully but the body was not what we expected.
    #[error("Malformed response: {message}\n\nSuggestion: Check that the client and service versions match")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },
}

/// Classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestErrorKind {
    /// Transport-level failure.
    Network,
    /// Non-success response.
    Server,
    /// Malformed response body.
    Decode,
}

impl std::fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Server => write!(f, "server"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

impl RequestError {
    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `Server` error with a suggestion derived from the status.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        let suggestion = if status >= 500 {
            "Retry later; the lesson service may be overloaded"
        } else {
            "Check the request input and try again"
        };
        Self::Server {
            status,
            message: message.into(),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> RequestErrorKind {
        match self {
            Self::Network { .. } => RequestErrorKind::Network,
            Self::Server { .. } => RequestErrorKind::Server,
            Self::Decode { .. } => RequestErrorKind::Decode,
        }
    }

    /// Returns `true` if a later retry of the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Server { status, .. } => *status >= 500,
            Self::Decode { .. } => false,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::server(status.as_u16(), err.to_string());
        }
        Self::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(RequestErrorKind::Network.to_string(), "network");
        assert_eq!(RequestErrorKind::Server.to_string(), "server");
        assert_eq!(RequestErrorKind::Decode.to_string(), "decode");
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            RequestError::network("refused").kind(),
            RequestErrorKind::Network
        );
        assert_eq!(
            RequestError::server(500, "boom").kind(),
            RequestErrorKind::Server
        );
        assert_eq!(
            RequestError::decode("bad json").kind(),
            RequestErrorKind::Decode
        );
    }

    #[test]
    fn test_is_transient() {
        assert!(RequestError::network("refused").is_transient());
        assert!(RequestError::server(503, "busy").is_transient());
        assert!(!RequestError::server(400, "Speech issue is required").is_transient());
        assert!(!RequestError::decode("missing field").is_transient());
    }

    #[test]
    fn test_server_display_includes_message_and_suggestion() {
        let err = RequestError::server(500, "AI failed to generate a lesson. Try again later.");
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("AI failed to generate a lesson"));
        assert!(msg.contains("Suggestion: Retry later"));
    }
}
