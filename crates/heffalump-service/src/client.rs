//! # Service Client
//!
//! [`ServiceClient`] is the sending half of the service actor. It implements
//! [`Transport`], so an adapter can talk to the in-process service exactly as
//! it would to a remote one. [`ServiceTransportFactory`] hands it to the
//! adapter's connection on first use.

use crate::error::ServiceError;
use crate::service::ServiceRequest;
use async_trait::async_trait;
use soap_adapter::{Message, Response, Transport, TransportError, TransportFactory, TransportOptions};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct ServiceClient {
    sender: mpsc::Sender<ServiceRequest>,
}

impl ServiceClient {
    pub fn new(sender: mpsc::Sender<ServiceRequest>) -> Self {
        Self { sender }
    }

    /// Takes the service up or down. While down, every call is rejected with a
    /// `SERVER_UNAVAILABLE` fault.
    #[instrument(skip(self))]
    pub async fn set_available(&self, available: bool) -> Result<(), ServiceError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ServiceRequest::SetAvailable {
                available,
                respond_to,
            })
            .await
            .map_err(|_| ServiceError::ServiceClosed)?;
        response.await.map_err(|_| ServiceError::ServiceDropped)
    }
}

#[async_trait]
impl Transport for ServiceClient {
    #[instrument(skip(self, message))]
    async fn call(&self, operation: &str, message: Message) -> Result<Response, TransportError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ServiceRequest::Call {
                operation: operation.to_string(),
                message,
                respond_to,
            })
            .await
            .map_err(|_| TransportError::Unreachable("service closed".into()))?;
        response
            .await
            .map_err(|_| TransportError::Unreachable("service dropped response channel".into()))?
    }
}

/// Connects adapters at `endpoint` to the in-process service.
pub struct ServiceTransportFactory {
    endpoint: String,
    client: ServiceClient,
}

impl ServiceTransportFactory {
    pub fn new(endpoint: impl Into<String>, client: ServiceClient) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl TransportFactory for ServiceTransportFactory {
    async fn connect(&self, options: &TransportOptions) -> Result<Arc<dyn Transport>, TransportError> {
        if options.endpoint != self.endpoint {
            return Err(TransportError::Unreachable(format!(
                "no service at {}",
                options.endpoint
            )));
        }
        info!(endpoint = %options.endpoint, debug = options.debug, "Connected");
        Ok(Arc::new(self.client.clone()))
    }
}
