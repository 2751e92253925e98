//! # Adapter Configuration
//!
//! Configuration is a small serde document:
//!
//! ```json
//! {
//!   "endpoint": "http://localhost:8080/HeffalumpsWS?wsdl",
//!   "operations": {
//!     "create": "createHeffalump",
//!     "read": "getHeffalump",
//!     "update": "updateHeffalump",
//!     "delete": "deleteHeffalump",
//!     "all": "allHeffalumps"
//!   },
//!   "logging_level": "debug",
//!   "enable_mock_setters": false
//! }
//! ```
//!
//! `logging_level` set to `debug` makes the connection log full payloads and
//! response bodies. `enable_mock_setters` allows replacing the transport with a
//! test double after construction.

use crate::connection::Operation;
use crate::error::AdapterError;
use serde::Deserialize;
use std::path::Path;

/// Remote operation identifier for each logical operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationNames {
    pub create: String,
    pub read: String,
    pub update: String,
    pub delete: String,
    pub all: String,
}

impl OperationNames {
    pub fn name(&self, operation: Operation) -> &str {
        match operation {
            Operation::Create => &self.create,
            Operation::Read => &self.read,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
            Operation::Query => &self.all,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdapterConfig {
    pub endpoint: String,
    pub operations: OperationNames,
    #[serde(default)]
    pub logging_level: Option<String>,
    #[serde(default)]
    pub enable_mock_setters: bool,
}

impl AdapterConfig {
    pub fn new(endpoint: impl Into<String>, operations: OperationNames) -> Self {
        Self {
            endpoint: endpoint.into(),
            operations,
            logging_level: None,
            enable_mock_setters: false,
        }
    }

    pub fn with_logging_level(mut self, level: impl Into<String>) -> Self {
        self.logging_level = Some(level.into());
        self
    }

    pub fn with_mock_setters(mut self, enabled: bool) -> Self {
        self.enable_mock_setters = enabled;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, AdapterError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AdapterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AdapterError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.endpoint.trim().is_empty() {
            return Err(AdapterError::Config("endpoint must not be empty".into()));
        }
        for operation in Operation::ALL {
            if self.operations.name(operation).trim().is_empty() {
                return Err(AdapterError::Config(format!(
                    "remote operation for {operation} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// True when `logging_level` is `debug`, in any case.
    pub fn debug(&self) -> bool {
        self.logging_level
            .as_deref()
            .is_some_and(|level| level.eq_ignore_ascii_case("debug"))
    }
}
