//! Error signalling
//!
//! The client hands every failed call to an [`ErrorReporter`] exactly once.
//! Reporters belong to the presentation layer and decide how, or whether,
//! the user is told.

#[cfg(test)]
use mockall::automock;
use serde_json::Value;
use tracing::warn;

/// User-facing message for network, timeout and non-2xx failures
pub const CONNECT_FAILURE_MESSAGE: &str = "Unable to connect to the server";

/// User-facing message when a failing body carries no message of its own
pub const FALLBACK_FAILURE_MESSAGE: &str = "Operation failed";

/// What produced an [`ErrorSignal`]
#[derive(Debug, Clone, PartialEq)]
pub enum SignalSource {
    /// The backend body that reported the failure
    Envelope(Value),
    /// Description of the transport failure
    Transport(String),
    /// A failure raised on the client side
    Client(String),
}

/// A failure, ready to be shown to a user
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSignal {
    /// Message suitable for display
    pub message: String,
    /// Where the failure came from
    pub source: SignalSource,
}

/// Subscriber notified once per failing call
#[cfg_attr(test, automock)]
pub trait ErrorReporter: Send + Sync {
    /// Handle a failure signal
    fn report(&self, signal: &ErrorSignal);
}

/// Reporter that logs signals through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, signal: &ErrorSignal) {
        match &signal.source {
            SignalSource::Envelope(body) => {
                warn!(user_message = %signal.message, %body, "Backend reported failure");
            },
            SignalSource::Transport(detail) => {
                warn!(user_message = %signal.message, %detail, "Transport failure");
            },
            SignalSource::Client(detail) => {
                warn!(user_message = %signal.message, %detail, "Client failure");
            },
        }
    }
}
