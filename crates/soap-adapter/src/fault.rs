//! # Fault Classification
//!
//! A remote call that rejects one or more records comes back as a [`SoapFault`]
//! carrying the full [`RecordResult`]. Before it reaches the caller, every fault
//! goes through [`classify`], which separates two very different situations:
//!
//! - **Outage**: at least one failed record reports [`SERVER_UNAVAILABLE`]. The
//!   caller gets a uniform [`ClassifiedError::ServerUnavailable`] it can retry on.
//!   The per-record detail is dropped.
//! - **Domain rejection**: anything else. The original fault is handed back
//!   untouched inside [`ClassifiedError::Domain`].
//!
//! The classifier is a free function over plain data, so it holds no state and
//! can be exercised without a transport.

use crate::connection::Operation;
use crate::record::{RecordOutcome, RecordResult};
use std::fmt;

/// Status code the remote service reports when it is down.
pub const SERVER_UNAVAILABLE: &str = "SERVER_UNAVAILABLE";

/// Message carried by every synthesized outage error.
pub const SERVER_UNAVAILABLE_MESSAGE: &str = "the remote service is currently unavailable";

/// A record-bearing fault raised by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapFault {
    operation: Operation,
    message: String,
    result: RecordResult,
}

impl SoapFault {
    pub fn new(operation: Operation, message: impl Into<String>, result: RecordResult) -> Self {
        Self {
            operation,
            message: message.into(),
            result,
        }
    }

    /// The logical operation that was rejected.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn result(&self) -> &RecordResult {
        &self.result
    }

    /// Human-readable summary of every failed record.
    pub fn result_message(&self) -> String {
        result_message(&self.result)
    }

    pub fn is_server_unavailable(&self) -> bool {
        is_server_unavailable(&self.result)
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}: {}", self.operation, self.message, self.result_message())
    }
}

impl std::error::Error for SoapFault {}

/// The two kinds of remote failure a caller can observe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifiedError {
    #[error("{}", SERVER_UNAVAILABLE_MESSAGE)]
    ServerUnavailable,
    #[error(transparent)]
    Domain(SoapFault),
}

impl ClassifiedError {
    pub fn is_server_unavailable(&self) -> bool {
        matches!(self, ClassifiedError::ServerUnavailable)
    }
}

/// Decides whether `fault` is an outage or a domain rejection.
pub fn classify(fault: SoapFault) -> ClassifiedError {
    if fault.is_server_unavailable() {
        tracing::warn!(
            operation = %fault.operation(),
            failed = fault.result().failed_records().count(),
            "Remote service unavailable"
        );
        ClassifiedError::ServerUnavailable
    } else {
        ClassifiedError::Domain(fault)
    }
}

/// True when any failed record reports [`SERVER_UNAVAILABLE`].
pub fn is_server_unavailable(result: &RecordResult) -> bool {
    result.failed_records().any(|record| {
        record
            .errors()
            .iter()
            .any(|e| e.status_code == SERVER_UNAVAILABLE)
    })
}

/// Joins the messages of all failed records with `"; "`.
pub fn result_message(result: &RecordResult) -> String {
    result
        .failed_records()
        .map(message_for_record)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Formats one record's errors as `"code: message"`, joined with `", "`.
pub fn message_for_record(record: &RecordOutcome) -> String {
    record
        .errors()
        .iter()
        .map(|e| format!("{}: {}", e.status_code, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}
