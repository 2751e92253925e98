//! # System Lifecycle
//!
//! [`HeffalumpSystem`] starts the service actor and points an [`Adapter`] at it.
//! Dropping the adapter and the client closes the service's channel; the actor
//! then leaves its loop and [`HeffalumpSystem::shutdown`] awaits it.
//!
//! ```rust
//! use heffalump_service::lifecycle::HeffalumpSystem;
//! use soap_adapter::Resource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = HeffalumpSystem::new()?;
//!     let mut heffalumps = vec![Resource::new(system.heffalump.clone()).with("color", "peach")?];
//!     system.adapter.create(&mut heffalumps).await?;
//!     system.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::client::{ServiceClient, ServiceTransportFactory};
use crate::error::ServiceError;
use crate::model;
use crate::service;
use soap_adapter::{Adapter, AdapterConfig, Model, OperationNames};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/HeffalumpsWS";

/// Configuration for the `HeffalumpsWS` operations at [`DEFAULT_ENDPOINT`].
pub fn default_config() -> AdapterConfig {
    AdapterConfig::new(
        DEFAULT_ENDPOINT,
        OperationNames {
            create: "createHeffalump".into(),
            read: "getHeffalump".into(),
            update: "updateHeffalump".into(),
            delete: "deleteHeffalump".into(),
            all: "allHeffalumps".into(),
        },
    )
}

pub struct HeffalumpSystem {
    /// Adapter connected to the running service.
    pub adapter: Adapter,

    /// Direct handle on the service, for availability control.
    pub client: ServiceClient,

    pub heffalump: Arc<Model>,

    handle: JoinHandle<()>,
}

impl HeffalumpSystem {
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_config(default_config())
    }

    /// Starts the service with the operation names from `config` and connects
    /// an adapter to it through `config.endpoint`.
    pub fn with_config(config: AdapterConfig) -> Result<Self, ServiceError> {
        let heffalump = model::heffalump()?;
        let (service, client) = service::new(config.operations.clone(), 32);
        let handle = tokio::spawn(service.run());

        let factory = Arc::new(ServiceTransportFactory::new(
            config.endpoint.clone(),
            client.clone(),
        ));
        let adapter = Adapter::new("default", config, factory)?;

        Ok(Self {
            adapter,
            client,
            heffalump,
            handle,
        })
    }

    /// Closes the service channel and waits for the actor to finish.
    pub async fn shutdown(self) -> Result<(), ServiceError> {
        info!("Shutting down system...");

        // The adapter's connection holds a client clone.
        drop(self.adapter);
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Service task failed: {:?}", e);
            return Err(ServiceError::TaskFailed(e.to_string()));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
