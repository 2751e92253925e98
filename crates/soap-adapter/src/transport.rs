//! # Transport Seam
//!
//! The adapter never speaks a wire protocol itself. Envelopes, schemas,
//! authentication and serialization belong to whatever implements [`Transport`];
//! the adapter only hands it a remote operation identifier and a flat payload.
//!
//! Transports are built lazily by a [`TransportFactory`] the first time a
//! [`Connection`](crate::connection::Connection) needs one.

use crate::error::TransportError;
use crate::model::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Raw answer to a remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    body: Option<String>,
}

impl Response {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    /// A response without a body.
    pub fn empty() -> Self {
        Self { body: None }
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The body, or `None` when it is absent or only whitespace.
    pub fn non_blank_body(&self) -> Option<&str> {
        self.body().filter(|b| !b.trim().is_empty())
    }
}

/// Invokes named remote operations.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, operation: &str, message: Message) -> Result<Response, TransportError>;
}

/// Options handed to a [`TransportFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Service descriptor location (a WSDL path or URL).
    pub endpoint: String,
    /// Ask the transport for wire-level debug output.
    pub debug: bool,
}

/// Builds the transport a connection will use.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(&self, options: &TransportOptions) -> Result<Arc<dyn Transport>, TransportError>;
}
