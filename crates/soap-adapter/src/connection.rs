//! # Connection Dispatcher
//!
//! A [`Connection`] routes the five logical [`Operation`]s to the remote
//! operation identifiers named in [`AdapterConfig`] and forwards payloads to a
//! [`Transport`]. Responses come back unmodified; parsing and fault
//! classification happen in the [`Adapter`](crate::adapter::Adapter).
//!
//! The transport is built on first use and kept for the connection's lifetime.
//! Construction is guarded by a [`OnceCell`], so concurrent first calls still
//! produce exactly one transport.

use crate::config::{AdapterConfig, OperationNames};
use crate::error::{AdapterError, TransportError};
use crate::model::Message;
use crate::transport::{Response, Transport, TransportFactory, TransportOptions};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, Span};

/// Logical operations the remote service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Query,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::Query,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Query => "query",
        };
        f.write_str(name)
    }
}

pub struct Connection {
    operations: OperationNames,
    options: TransportOptions,
    factory: Arc<dyn TransportFactory>,
    transport: OnceCell<Arc<dyn Transport>>,
    expose_transport: bool,
    span: Span,
}

impl Connection {
    pub fn new(config: &AdapterConfig, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            operations: config.operations.clone(),
            options: TransportOptions {
                endpoint: config.endpoint.clone(),
                debug: config.debug(),
            },
            factory,
            transport: OnceCell::new(),
            expose_transport: config.enable_mock_setters,
            span: Span::current(),
        }
    }

    /// Records every call under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Replaces the transport with a test double.
    ///
    /// Only allowed when the configuration sets `enable_mock_setters`.
    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) -> Result<(), AdapterError> {
        if !self.expose_transport {
            return Err(AdapterError::Config(
                "transport override requires enable_mock_setters".into(),
            ));
        }
        self.transport = OnceCell::new_with(Some(transport));
        Ok(())
    }

    /// The transport, built on first use.
    pub async fn transport(&self) -> Result<&Arc<dyn Transport>, TransportError> {
        self.transport
            .get_or_try_init(|| async {
                info!(parent: &self.span, endpoint = %self.options.endpoint, "Connecting");
                self.factory.connect(&self.options).await
            })
            .await
    }

    pub fn operation_name(&self, operation: Operation) -> &str {
        self.operations.name(operation)
    }

    pub async fn call_create(&self, message: Message) -> Result<Response, TransportError> {
        self.call_service(Operation::Create, message).await
    }

    pub async fn call_update(&self, message: Message) -> Result<Response, TransportError> {
        self.call_service(Operation::Update, message).await
    }

    pub async fn call_delete(&self, keys: Message) -> Result<Response, TransportError> {
        self.call_service(Operation::Delete, keys).await
    }

    pub async fn call_get(&self, keys: Message) -> Result<Response, TransportError> {
        self.call_service(Operation::Read, keys).await
    }

    pub async fn call_query(&self, query: Message) -> Result<Response, TransportError> {
        self.call_service(Operation::Query, query).await
    }

    #[instrument(
        parent = &self.span,
        skip(self, message),
        fields(remote = self.operations.name(operation))
    )]
    pub async fn call_service(
        &self,
        operation: Operation,
        message: Message,
    ) -> Result<Response, TransportError> {
        if self.options.debug {
            debug!(?message, "Calling remote operation");
        } else {
            debug!("Calling remote operation");
        }

        let transport = self.transport().await?;
        let response = transport
            .call(self.operations.name(operation), message)
            .await?;

        if self.options.debug {
            debug!(body = ?response.body(), "Remote operation returned");
        }
        Ok(response)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("operations", &self.operations)
            .field("options", &self.options)
            .field("connected", &self.transport.initialized())
            .finish()
    }
}
