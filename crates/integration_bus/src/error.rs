//! Client error types

use serde_json::Value;
use thiserror::Error;

use crate::envelope::ApplicationFailure;
use crate::notify::{CONNECT_FAILURE_MESSAGE, ErrorSignal, SignalSource};

/// Errors that can occur while talking to the bus system backend
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout in milliseconds
        timeout_ms: u64,
    },

    /// The backend could not be reached or the exchange broke off
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The backend answered with a non-2xx status
    #[error("HTTP {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Raw response body, kept for programmatic handling
        body: String,
    },

    /// A 2xx response whose body signalled a domain-level failure
    #[error("{message}")]
    Application {
        /// Server-provided message, or the generic fallback
        message: String,
        /// The body that carried the failure
        envelope: Value,
    },

    /// A normalized payload did not match the expected model
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ApiError {
    /// Returns true for network, timeout and non-2xx failures
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionFailed(_) | Self::HttpStatus { .. }
        )
    }

    /// Returns true if the backend reported a failure inside a 2xx response
    #[must_use]
    pub const fn is_application(&self) -> bool {
        matches!(self, Self::Application { .. })
    }

    /// Returns true if reissuing the same call may succeed
    ///
    /// The client itself never retries; this is a hint for callers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionFailed(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Build the user-facing signal for this error
    #[must_use]
    pub fn signal(&self) -> ErrorSignal {
        match self {
            Self::Application { message, envelope } => ErrorSignal {
                message: message.clone(),
                source: SignalSource::Envelope(envelope.clone()),
            },
            Self::Timeout { .. } | Self::ConnectionFailed(_) | Self::HttpStatus { .. } => {
                ErrorSignal {
                    message: CONNECT_FAILURE_MESSAGE.to_string(),
                    source: SignalSource::Transport(self.to_string()),
                }
            },
            Self::ParseError(_) | Self::ConfigurationError(_) => ErrorSignal {
                message: self.to_string(),
                source: SignalSource::Client(self.to_string()),
            },
        }
    }
}

impl From<ApplicationFailure> for ApiError {
    fn from(failure: ApplicationFailure) -> Self {
        Self::Application {
            message: failure.message,
            envelope: failure.envelope,
        }
    }
}

/// Errors that can occur while loading the map SDK
#[derive(Debug, Clone, Error)]
pub enum MapLoadError {
    /// No provider access key configured
    #[error("Map SDK access key is not configured")]
    MissingApiKey,

    /// The SDK URL could not be built from the configuration
    #[error("Invalid map SDK URL: {0}")]
    InvalidUrl(String),

    /// The script could not be downloaded
    #[error("Failed to load map SDK: {0}")]
    Network(String),

    /// The provider answered with a non-2xx status
    #[error("Map SDK request failed with HTTP {0}")]
    HttpStatus(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors() {
        assert!(ApiError::Timeout { timeout_ms: 5000 }.is_transport());
        assert!(ApiError::ConnectionFailed("refused".to_string()).is_transport());
        assert!(
            ApiError::HttpStatus {
                status: 404,
                body: String::new()
            }
            .is_transport()
        );
        assert!(!ApiError::ParseError("bad".to_string()).is_transport());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ApiError::Timeout { timeout_ms: 5000 }.is_retryable());
        assert!(
            ApiError::HttpStatus {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ApiError::HttpStatus {
                status: 404,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ApiError::Application {
                message: "duplicate id".to_string(),
                envelope: Value::Null,
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_transport_signal_is_generic() {
        let err = ApiError::HttpStatus {
            status: 500,
            body: r#"{"code":500,"msg":"boom"}"#.to_string(),
        };
        let signal = err.signal();
        assert_eq!(signal.message, CONNECT_FAILURE_MESSAGE);
        assert!(matches!(signal.source, SignalSource::Transport(ref s) if s.contains("500")));
    }

    #[test]
    fn test_application_signal_carries_envelope() {
        let envelope = serde_json::json!({ "code": 400, "msg": "station exists" });
        let err = ApiError::Application {
            message: "station exists".to_string(),
            envelope: envelope.clone(),
        };
        let signal = err.signal();
        assert_eq!(signal.message, "station exists");
        assert_eq!(signal.source, SignalSource::Envelope(envelope));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Timeout { timeout_ms: 5000 };
        assert!(err.to_string().contains("5000"));

        let err = ApiError::HttpStatus {
            status: 502,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP 502");
    }
}
