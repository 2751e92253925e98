//! # Heffalump Service
//!
//! An in-process stand-in for the remote `HeffalumpsWS` service, plus the wiring
//! that points a [`soap_adapter::Adapter`] at it.
//!
//! - **[service]**: the actor that owns the heffalump table and answers remote operations.
//! - **[client]**: [`ServiceClient`](client::ServiceClient), the [`Transport`](soap_adapter::Transport) side of the actor.
//! - **[model]**: the `Heffalump` model definition.
//! - **[lifecycle]**: [`HeffalumpSystem`](lifecycle::HeffalumpSystem) starts and stops everything.

pub mod client;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod service;
