//! Response normalization
//!
//! The backend wraps payloads inconsistently: some endpoints answer with
//! `{ code, msg, data | content }`, the admin endpoints with
//! `{ success, message }`, and the query endpoints with the bare payload.
//! [`Envelope::decode`] classifies a body into one of these shapes and
//! [`normalize`] turns it into the value callers consume.
//!
//! Nothing in this module performs I/O or notifies anyone.

use serde_json::{Map, Value};

use crate::config::NormalizationMode;
use crate::notify::FALLBACK_FAILURE_MESSAGE;

/// Shape of a response body
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Missing body or any non-object value, treated as the final payload
    Bare(Value),
    /// Object carrying a `code` field, `null` included
    Coded {
        /// The `code` value as sent
        code: Value,
        /// The whole object
        body: Map<String, Value>,
    },
    /// Object without `code` but with a boolean `success` field
    Status {
        /// The `success` flag
        success: bool,
        /// The whole object
        body: Map<String, Value>,
    },
    /// Any other object
    Unrecognized(Map<String, Value>),
}

/// A 2xx body that reported a domain-level failure
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationFailure {
    /// Server-provided message, or [`FALLBACK_FAILURE_MESSAGE`]
    pub message: String,
    /// The body that carried the failure
    pub envelope: Value,
}

impl Envelope {
    /// Classify a response body
    #[must_use]
    pub fn decode(body: Value) -> Self {
        let Value::Object(map) = body else {
            return Self::Bare(body);
        };

        if let Some(code) = map.get("code").cloned() {
            return Self::Coded { code, body: map };
        }

        if let Some(success) = map.get("success").and_then(Value::as_bool) {
            return Self::Status { success, body: map };
        }

        Self::Unrecognized(map)
    }

    /// Whether this envelope reports a failure
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Coded { code, .. } => !is_success_code(code),
            Self::Status { success, .. } => !success,
            Self::Bare(_) | Self::Unrecognized(_) => false,
        }
    }

    /// Message attached to the body, if any
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Coded { body, .. } => first_message(body, &["msg", "message"]),
            Self::Status { body, .. } | Self::Unrecognized(body) => {
                first_message(body, &["message", "msg"])
            },
            Self::Bare(_) => None,
        }
    }

    /// Extract the payload, ignoring any failure indication
    ///
    /// Prefers a truthy `content`, then a truthy `data`, then the body itself.
    #[must_use]
    pub fn into_payload(self) -> Value {
        match self {
            Self::Bare(value) => value,
            Self::Coded { body, .. } | Self::Status { body, .. } | Self::Unrecognized(body) => {
                unwrap_body(body)
            },
        }
    }

    fn into_body(self) -> Value {
        match self {
            Self::Bare(value) => value,
            Self::Coded { body, .. } | Self::Status { body, .. } | Self::Unrecognized(body) => {
                Value::Object(body)
            },
        }
    }
}

/// Normalize a successful response body according to `mode`
///
/// # Errors
///
/// In [`NormalizationMode::Unwrap`], returns an [`ApplicationFailure`] when the
/// body carries a `code` other than `200`/`0`, or `success: false`.
pub fn normalize(body: Value, mode: NormalizationMode) -> Result<Value, ApplicationFailure> {
    if mode == NormalizationMode::PassThrough {
        return Ok(body);
    }

    let envelope = Envelope::decode(body);
    if envelope.is_failure() {
        let message = envelope
            .message()
            .unwrap_or(FALLBACK_FAILURE_MESSAGE)
            .to_string();
        return Err(ApplicationFailure {
            message,
            envelope: envelope.into_body(),
        });
    }

    Ok(envelope.into_payload())
}

/// `null`, `false`, `0` and `""`; arrays and objects are never falsy
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v.abs() < f64::EPSILON),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// `200` and `0` are the success sentinels, compared numerically
fn is_success_code(code: &Value) -> bool {
    code.as_f64()
        .is_some_and(|c| (c - 200.0).abs() < f64::EPSILON || c.abs() < f64::EPSILON)
}

fn first_message<'a>(body: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|msg| !msg.is_empty())
}

fn unwrap_body(mut body: Map<String, Value>) -> Value {
    let nested = ["content", "data"]
        .into_iter()
        .find(|key| body.get(*key).is_some_and(|v| !is_falsy(v)));

    match nested.and_then(|key| body.remove(key)) {
        Some(inner) => inner,
        None => Value::Object(body),
    }
}
