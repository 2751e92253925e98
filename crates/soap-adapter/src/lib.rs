//! # SOAP Adapter
//!
//! An adapter that lets a record mapping runtime run CRUD and query operations
//! against a remote service exposing only a fixed set of named operations:
//! create, read-by-key, update, delete and query-all.
//!
//! ## Architecture Overview
//!
//! 1. **Data** ([`Model`], [`Resource`], [`RecordResult`]) - what moves between caller and service
//! 2. **Dispatch** ([`Connection`]) - maps logical operations to remote operation names
//! 3. **Classification** ([`fault`]) - outage vs. domain rejection
//! 4. **Orchestration** ([`Adapter`]) - payload building, reconciliation, error routing
//!
//! Wire transport, envelope handling and serialization stay behind the
//! [`Transport`] and [`ResponseParser`] traits.
//!
//! ## Example
//!
//! ```rust
//! use soap_adapter::mock::{MockTransport, MockTransportFactory};
//! use soap_adapter::{Adapter, AdapterConfig, Model, Property, PropertyKind, Resource, Value};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AdapterConfig::from_json_str(r#"{
//!         "endpoint": "http://localhost/HeffalumpsWS",
//!         "operations": {
//!             "create": "createHeffalump", "read": "getHeffalump",
//!             "update": "updateHeffalump", "delete": "deleteHeffalump",
//!             "all": "allHeffalumps"
//!         }
//!     }"#).unwrap();
//!
//!     let heffalump = Model::builder("Heffalump")
//!         .property(Property::new("id", PropertyKind::Integer).key())
//!         .property(Property::new("color", PropertyKind::Text))
//!         .build()
//!         .unwrap();
//!
//!     let mock = MockTransport::new();
//!     mock.expect_call("createHeffalump")
//!         .return_body(r#"{"heffalump": {"id": "2", "color": "peach"}}"#);
//!
//!     let adapter = Adapter::new("default", config, Arc::new(MockTransportFactory::new(mock))).unwrap();
//!     let mut resources = vec![Resource::new(heffalump).with("color", "peach").unwrap()];
//!     adapter.create(&mut resources).await.unwrap();
//!
//!     assert_eq!(resources[0].get("id"), Some(&Value::Integer(2)));
//! }
//! ```
//!
//! ## Errors
//!
//! Callers see a result or an [`AdapterError`]. Remote rejections arrive as
//! [`AdapterError::Remote`] holding either [`ClassifiedError::ServerUnavailable`]
//! (retry later) or [`ClassifiedError::Domain`] with the untouched [`SoapFault`].
//!
//! ## Testing
//!
//! See the [`mock`] module for an in-memory transport with call expectations.

pub mod adapter;
pub mod config;
pub mod connection;
pub mod error;
pub mod fault;
pub mod logging;
pub mod mock;
pub mod model;
pub mod parser;
pub mod query;
pub mod record;
pub mod transport;

pub use adapter::Adapter;
pub use config::{AdapterConfig, OperationNames};
pub use connection::{Connection, Operation};
pub use error::{AdapterError, TransportError};
pub use fault::{classify, ClassifiedError, SoapFault, SERVER_UNAVAILABLE};
pub use model::{Message, Model, ModelBuilder, Property, PropertyKind, Resource, Value};
pub use parser::{JsonResponseParser, ResponseParser};
pub use query::{Condition, FlatQueryTranslator, Predicate, Query, QueryMessage, QueryTranslator};
pub use record::{RecordError, RecordOutcome, RecordResult};
pub use transport::{Response, Transport, TransportFactory, TransportOptions};
