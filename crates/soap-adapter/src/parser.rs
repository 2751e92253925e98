//! # Response Parsing
//!
//! Turns a raw response body into per-record maps keyed by wire field name.
//! The adapter only depends on the [`ResponseParser`] trait; [`JsonResponseParser`]
//! is the default.

use crate::error::AdapterError;
use crate::model::{Message, Model};

pub trait ResponseParser: Send + Sync {
    /// Parses a body describing exactly one record.
    fn parse_record(&self, body: &str, model: &Model) -> Result<Message, AdapterError>;

    /// Parses a body describing any number of records.
    fn parse_records(&self, body: &str, model: &Model) -> Result<Vec<Message>, AdapterError>;
}

/// Parses JSON bodies.
///
/// A record is an object of wire fields. A body may wrap its payload in an
/// object with a single key equal to the model's storage name, as an XML
/// document wraps it in a root element: `{"heffalump": {"id": "2"}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseParser;

impl JsonResponseParser {
    fn parse(&self, body: &str, model: &Model) -> Result<serde_json::Value, AdapterError> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| AdapterError::Parse(e.to_string()))?;
        Ok(unwrap_root(value, model.storage_name()))
    }
}

/// Strips a `{root: payload}` wrapper. A scalar under `root` is a one-field
/// record whose field shares the storage name, so it stays as is.
fn unwrap_root(value: serde_json::Value, root: &str) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Json::Object(mut map)
            if map.len() == 1
                && matches!(
                    map.get(root),
                    Some(Json::Object(_) | Json::Array(_) | Json::Null)
                ) =>
        {
            map.remove(root).unwrap_or_default()
        }
        other => other,
    }
}

fn expect_object(value: serde_json::Value) -> Result<Message, AdapterError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(AdapterError::Parse(format!(
            "expected a record object, found {other}"
        ))),
    }
}

impl ResponseParser for JsonResponseParser {
    fn parse_record(&self, body: &str, model: &Model) -> Result<Message, AdapterError> {
        expect_object(self.parse(body, model)?)
    }

    fn parse_records(&self, body: &str, model: &Model) -> Result<Vec<Message>, AdapterError> {
        match self.parse(body, model)? {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| expect_object(unwrap_root(item, model.storage_name())))
                .collect(),
            serde_json::Value::Null => Ok(Vec::new()),
            single => Ok(vec![expect_object(single)?]),
        }
    }
}
