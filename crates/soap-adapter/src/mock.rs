//! # Mock Transport & Testing Guide
//!
//! [`MockTransport`] implements [`Transport`] entirely in memory. Queue up the
//! remote calls you expect, in order, together with what each should return:
//!
//! ```rust
//! use soap_adapter::mock::MockTransport;
//! use soap_adapter::Transport;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_call("createHeffalump")
//!         .return_body(r#"{"id": "1", "color": "peach"}"#);
//!
//!     let response = mock.call("createHeffalump", Default::default()).await.unwrap();
//!     assert!(response.body().is_some());
//!
//!     mock.verify(); // every expectation was consumed
//! }
//! ```
//!
//! | Builder | Simulates |
//! |---------|-----------|
//! | `return_body` | a successful call with a body |
//! | `return_empty` | a successful call without a body |
//! | `return_fault` | a per-record rejection ([`SoapFault`]) |
//! | `return_err` | any other [`TransportError`] |
//!
//! `with_message` additionally asserts the exact payload of the call.
//!
//! Wire a mock into a [`Connection`](crate::connection::Connection) through
//! [`MockTransportFactory`], or swap it in afterwards with
//! `set_transport` when the configuration enables mock setters.

use crate::error::TransportError;
use crate::fault::SoapFault;
use crate::model::Message;
use crate::transport::{Response, Transport, TransportFactory, TransportOptions};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation {
    operation: String,
    message: Option<Message>,
    response: Result<Response, TransportError>,
}

#[derive(Default)]
struct State {
    expectations: VecDeque<Expectation>,
    calls: Vec<(String, Message)>,
}

/// An in-memory transport with expectation tracking.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a call to the remote operation `operation`.
    pub fn expect_call(&self, operation: impl Into<String>) -> CallExpectationBuilder {
        CallExpectationBuilder {
            operation: operation.into(),
            message: None,
            state: self.state.clone(),
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<(String, Message)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, operation: &str, message: Message) -> Result<Response, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((operation.to_string(), message.clone()));
        let expectation = state
            .expectations
            .pop_front()
            .unwrap_or_else(|| panic!("Unexpected call to {operation}"));
        drop(state);

        assert_eq!(
            expectation.operation, operation,
            "Expected call to {}, got {}",
            expectation.operation, operation
        );
        if let Some(expected) = expectation.message {
            assert_eq!(expected, message, "Unexpected payload for {operation}");
        }
        expectation.response
    }
}

/// Builder for a single call expectation.
pub struct CallExpectationBuilder {
    operation: String,
    message: Option<Message>,
    state: Arc<Mutex<State>>,
}

impl CallExpectationBuilder {
    /// Also asserts the payload of the call.
    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    pub fn return_body(self, body: impl Into<String>) {
        self.push(Ok(Response::new(body)));
    }

    pub fn return_empty(self) {
        self.push(Ok(Response::empty()));
    }

    pub fn return_fault(self, fault: SoapFault) {
        self.push(Err(TransportError::Fault(fault)));
    }

    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Response, TransportError>) {
        let mut state = self.state.lock().unwrap();
        state.expectations.push_back(Expectation {
            operation: self.operation,
            message: self.message,
            response,
        });
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Hands out a fixed transport and counts how often it was asked to.
pub struct MockTransportFactory {
    transport: Result<MockTransport, TransportError>,
    connections: AtomicUsize,
    last_options: Mutex<Option<TransportOptions>>,
}

impl MockTransportFactory {
    pub fn new(transport: MockTransport) -> Self {
        Self {
            transport: Ok(transport),
            connections: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// A factory whose every `connect` fails with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self {
            transport: Err(error),
            connections: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// Number of `connect` calls so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<TransportOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn connect(&self, options: &TransportOptions) -> Result<Arc<dyn Transport>, TransportError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        match &self.transport {
            Ok(mock) => Ok(Arc::new(mock.clone())),
            Err(e) => Err(e.clone()),
        }
    }
}
