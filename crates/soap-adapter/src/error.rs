//! # Adapter Errors
//!
//! Every fallible operation in the crate returns [`AdapterError`]. Remote faults
//! only ever surface through [`AdapterError::Remote`], after they have been
//! through the [`fault`](crate::fault) classifier.

use crate::fault::{ClassifiedError, SoapFault};

/// Failures reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The service answered with per-record failures.
    #[error(transparent)]
    Fault(SoapFault),
    #[error("Service unreachable: {0}")]
    Unreachable(String),
    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error("Session timed out")]
    SessionTimeout,
    #[error("Unknown status code: {0}")]
    UnknownStatusCode(String),
}

/// Errors surfaced by the adapter to its caller.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error(transparent)]
    Remote(#[from] ClassifiedError),
    #[error("Transport error: {0}")]
    Transport(TransportError),
    #[error("Unparseable response body: {0}")]
    Parse(String),
    #[error("Cannot cast {value} to {kind} for property {property}")]
    Typecast {
        property: String,
        kind: String,
        value: String,
    },
    #[error("Unknown property {property} on model {model}")]
    UnknownProperty { model: String, property: String },
    #[error("Resource of {model} has no value for key property {property}")]
    MissingKey { model: String, property: String },
    #[error("Model {model} has {expected} key properties but {given} key values were given")]
    KeyArity {
        model: String,
        expected: usize,
        given: usize,
    },
    #[error("Invalid model {model}: {reason}")]
    InvalidModel { model: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    /// True for the retry-signaling outage error.
    pub fn is_server_unavailable(&self) -> bool {
        matches!(self, AdapterError::Remote(ClassifiedError::ServerUnavailable))
    }

    /// The untouched remote fault, when this is a domain rejection.
    pub fn domain_fault(&self) -> Option<&SoapFault> {
        match self {
            AdapterError::Remote(ClassifiedError::Domain(fault)) => Some(fault),
            _ => None,
        }
    }
}

/// Routes transport failures through the classifier.
///
/// Record-bearing faults are classified; every other transport failure is
/// reported as-is.
impl From<TransportError> for AdapterError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Fault(fault) => AdapterError::Remote(crate::fault::classify(fault)),
            other => AdapterError::Transport(other),
        }
    }
}
