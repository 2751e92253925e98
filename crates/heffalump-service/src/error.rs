//! Error types for the heffalump service.

use soap_adapter::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service closed")]
    ServiceClosed,

    #[error("Service dropped response channel")]
    ServiceDropped,

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// The service task panicked or was cancelled.
    #[error("Service task failed: {0}")]
    TaskFailed(String),
}
