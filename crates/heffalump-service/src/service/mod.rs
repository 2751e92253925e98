//! # Heffalump Service Actor
//!
//! [`HeffalumpService`] plays the remote side of the adapter. It owns the
//! heffalump table and answers the five remote operations named in
//! [`OperationNames`], one request at a time, in its own Tokio task.
//!
//! ## Wire behavior
//!
//! - Records come back wrapped as `{"heffalump": ...}` with every scalar
//!   rendered as a string, the way a text document would carry them.
//! - `read` of a missing id answers with no body.
//! - While the service is marked unavailable, every call is rejected with a
//!   [`SERVER_UNAVAILABLE`] fault.
//! - Invalid submissions are rejected with a per-record fault carrying a
//!   domain status code.
//!
//! ## Usage
//!
//! ```rust
//! use heffalump_service::service;
//! use soap_adapter::{OperationNames, Transport};
//!
//! #[tokio::main]
//! async fn main() {
//!     let names = OperationNames {
//!         create: "createHeffalump".into(),
//!         read: "getHeffalump".into(),
//!         update: "updateHeffalump".into(),
//!         delete: "deleteHeffalump".into(),
//!         all: "allHeffalumps".into(),
//!     };
//!     let (service, client) = service::new(names, 32);
//!     tokio::spawn(service.run());
//!
//!     let mut message = soap_adapter::Message::new();
//!     message.insert("color".into(), "peach".into());
//!     let response = client.call("createHeffalump", message).await.unwrap();
//!     assert_eq!(
//!         response.body(),
//!         Some(r#"{"heffalump":{"color":"peach","id":"1"}}"#)
//!     );
//! }
//! ```

use crate::client::ServiceClient;
use crate::model::STORAGE_NAME;
use serde::Deserialize;
use soap_adapter::{
    Message, Operation, OperationNames, QueryMessage, RecordError, RecordOutcome, RecordResult,
    Response, SoapFault, TransportError, SERVER_UNAVAILABLE,
};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Status codes the service reports for rejected records.
pub mod status {
    pub const INVALID_FIELD: &str = "INVALID_FIELD";
    pub const INVALID_TYPE: &str = "INVALID_TYPE";
    pub const MISSING_ARGUMENT: &str = "MISSING_ARGUMENT";
    pub const ENTITY_IS_DELETED: &str = "ENTITY_IS_DELETED";
    pub const MALFORMED_QUERY: &str = "MALFORMED_QUERY";
}

/// Messages accepted by the service actor.
#[derive(Debug)]
pub enum ServiceRequest {
    Call {
        operation: String,
        message: Message,
        respond_to: oneshot::Sender<Result<Response, TransportError>>,
    },
    SetAvailable {
        available: bool,
        respond_to: oneshot::Sender<()>,
    },
}

pub struct HeffalumpService {
    receiver: mpsc::Receiver<ServiceRequest>,
    operations: OperationNames,
    store: BTreeMap<i64, Message>,
    next_id: i64,
    available: bool,
}

/// Creates the service actor and its client.
pub fn new(operations: OperationNames, buffer_size: usize) -> (HeffalumpService, ServiceClient) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let service = HeffalumpService {
        receiver,
        operations,
        store: BTreeMap::new(),
        next_id: 1,
        available: true,
    };
    (service, ServiceClient::new(sender))
}

/// A submitted record, typed. Fields the table has no column for are dropped.
#[derive(Debug, Deserialize)]
struct Submission {
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    num_spots: Option<i64>,
    #[serde(default)]
    striped: Option<bool>,
}

impl Submission {
    /// The row as the table keeps it: the assigned id plus every non-nil
    /// column, rendered as strings.
    fn into_record(self, id: i64) -> Message {
        let columns = [
            ("id", Some(id.to_string())),
            ("color", self.color),
            ("num_spots", self.num_spots.map(|n| n.to_string())),
            ("striped", self.striped.map(|b| b.to_string())),
        ];
        columns
            .into_iter()
            .filter_map(|(column, value)| Some((column.to_string(), serde_json::Value::String(value?))))
            .collect()
    }
}

impl HeffalumpService {
    /// Runs the event loop until every client is dropped.
    pub async fn run(mut self) {
        info!(service = STORAGE_NAME, "Service started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ServiceRequest::Call {
                    operation,
                    message,
                    respond_to,
                } => {
                    let result = self.handle(&operation, message);
                    if let Err(e) = &result {
                        warn!(service = STORAGE_NAME, operation = %operation, error = %e, "Call rejected");
                    }
                    let _ = respond_to.send(result);
                }
                ServiceRequest::SetAvailable {
                    available,
                    respond_to,
                } => {
                    info!(service = STORAGE_NAME, available, "Availability changed");
                    self.available = available;
                    let _ = respond_to.send(());
                }
            }
        }

        info!(service = STORAGE_NAME, size = self.store.len(), "Shutdown");
    }

    fn handle(&mut self, name: &str, message: Message) -> Result<Response, TransportError> {
        let operation = Operation::ALL
            .into_iter()
            .find(|op| self.operations.name(*op) == name)
            .ok_or_else(|| TransportError::Unreachable(format!("no such operation: {name}")))?;
        debug!(service = STORAGE_NAME, %operation, ?message, "Call");

        if !self.available {
            return Err(reject(
                operation,
                SERVER_UNAVAILABLE,
                "service is down for maintenance",
            ));
        }

        match operation {
            Operation::Create => self.create(message),
            Operation::Read => self.read(&message),
            Operation::Update => self.update(message),
            Operation::Delete => self.delete(&message),
            Operation::Query => self.query(&message),
        }
    }

    fn create(&mut self, message: Message) -> Result<Response, TransportError> {
        let submission = validate(Operation::Create, &message)?;
        let id = self.next_id;
        self.next_id += 1;

        let record = submission.into_record(id);
        let body = envelope(serde_json::Value::Object(record.clone()));
        self.store.insert(id, record);
        info!(service = STORAGE_NAME, id, size = self.store.len(), "Created");
        Ok(Response::new(body))
    }

    fn read(&self, message: &Message) -> Result<Response, TransportError> {
        let id = id_of(Operation::Read, message)?;
        match self.store.get(&id) {
            Some(record) => Ok(Response::new(envelope(serde_json::Value::Object(
                record.clone(),
            )))),
            None => {
                debug!(service = STORAGE_NAME, id, "Not found");
                Ok(Response::empty())
            }
        }
    }

    fn update(&mut self, message: Message) -> Result<Response, TransportError> {
        let id = id_of(Operation::Update, &message)?;
        let submission = validate(Operation::Update, &message)?;
        let Some(slot) = self.store.get_mut(&id) else {
            return Err(reject(
                Operation::Update,
                status::ENTITY_IS_DELETED,
                &format!("no heffalump with id {id}"),
            ));
        };

        *slot = submission.into_record(id);
        info!(service = STORAGE_NAME, id, "Updated");
        Ok(Response::new(envelope(serde_json::Value::Object(slot.clone()))))
    }

    fn delete(&mut self, message: &Message) -> Result<Response, TransportError> {
        let id = id_of(Operation::Delete, message)?;
        if self.store.remove(&id).is_none() {
            return Err(reject(
                Operation::Delete,
                status::ENTITY_IS_DELETED,
                &format!("no heffalump with id {id}"),
            ));
        }
        info!(service = STORAGE_NAME, id, size = self.store.len(), "Deleted");
        Ok(Response::empty())
    }

    fn query(&self, message: &Message) -> Result<Response, TransportError> {
        let query = QueryMessage::from_message(message)
            .map_err(|e| reject(Operation::Query, status::MALFORMED_QUERY, &e.to_string()))?;

        let records: Vec<serde_json::Value> = self
            .store
            .values()
            .filter(|record| query.matches(record))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .map(serde_json::Value::Object)
            .collect();

        debug!(service = STORAGE_NAME, count = records.len(), "Query");
        Ok(Response::new(envelope(serde_json::Value::Array(records))))
    }
}

/// A single-record fault with one error.
fn reject(operation: Operation, code: &str, message: &str) -> TransportError {
    TransportError::Fault(SoapFault::new(
        operation,
        format!("{operation} rejected"),
        RecordResult::new(vec![RecordOutcome::failed(RecordError::new(code, message))]),
    ))
}

fn validate(operation: Operation, message: &Message) -> Result<Submission, TransportError> {
    let submission: Submission = serde_json::from_value(serde_json::Value::Object(message.clone()))
        .map_err(|e| reject(operation, status::INVALID_TYPE, &e.to_string()))?;

    if submission.num_spots.is_some_and(|n| n < 0) {
        return Err(reject(
            operation,
            status::INVALID_FIELD,
            "num_spots must not be negative",
        ));
    }
    Ok(submission)
}

fn id_of(operation: Operation, message: &Message) -> Result<i64, TransportError> {
    let id = message.get("id").and_then(|id| match id {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    });
    id.ok_or_else(|| reject(operation, status::MISSING_ARGUMENT, "id is required"))
}

fn envelope(payload: serde_json::Value) -> String {
    let mut root = serde_json::Map::new();
    root.insert(STORAGE_NAME.into(), payload);
    serde_json::Value::Object(root).to_string()
}
