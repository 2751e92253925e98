//! # Models, Properties and Resources
//!
//! The adapter does not own a mapping runtime; it only needs enough of one to
//! move values between a resource and a remote payload:
//!
//! - [`Model`]: the property set of a resource type and which properties form its key.
//! - [`Property`]: a typed field with a *wire field name*, the name used in remote
//!   payloads, which may differ from the in-model name.
//! - [`Resource`]: one instance of a model holding a value per property.
//!
//! A model precomputes its wire-field lookup table once, in [`ModelBuilder::build`],
//! and refuses to build when two properties share a name or a wire field. Every
//! reconciliation afterwards is a plain map lookup.

use crate::error::AdapterError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Flat remote payload: wire field name to JSON value.
pub type Message = serde_json::Map<String, serde_json::Value>;

/// A property value held by a [`Resource`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Value::from(*x),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        serde_json::Value::from(&v)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

/// Primitive type of a [`Property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Integer,
    Float,
    Text,
    Boolean,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::Integer => "integer",
            PropertyKind::Float => "float",
            PropertyKind::Text => "text",
            PropertyKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A typed, named field of a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    field: String,
    kind: PropertyKind,
    key: bool,
}

impl Property {
    /// A property whose wire field name equals its model name.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        let name = name.into();
        Self {
            field: name.clone(),
            name,
            kind,
            key: false,
        }
    }

    /// Overrides the wire field name.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Marks the property as part of the model key.
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    /// Coerces a raw wire value into this property's type.
    ///
    /// Text-based payloads deliver every scalar as a string, so numeric and
    /// boolean strings are parsed. An empty string is nil for non-text kinds.
    pub fn typecast(&self, raw: &serde_json::Value) -> Result<Value, AdapterError> {
        use serde_json::Value as Json;

        let cast = match (self.kind, raw) {
            (_, Json::Null) => Some(Value::Nil),
            (PropertyKind::Text, Json::String(s)) => Some(Value::Text(s.clone())),
            (PropertyKind::Text, Json::Number(n)) => Some(Value::Text(n.to_string())),
            (PropertyKind::Text, Json::Bool(b)) => Some(Value::Text(b.to_string())),
            (_, Json::String(s)) if s.trim().is_empty() => Some(Value::Nil),
            (PropertyKind::Integer, Json::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole))
                .map(Value::Integer),
            (PropertyKind::Integer, Json::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
                    .map(Value::Integer)
            }
            (PropertyKind::Float, Json::Number(n)) => n.as_f64().map(Value::Float),
            (PropertyKind::Float, Json::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(Value::Float),
            (PropertyKind::Boolean, Json::Bool(b)) => Some(Value::Boolean(*b)),
            (PropertyKind::Boolean, Json::String(s)) => match s.trim() {
                "true" | "1" => Some(Value::Boolean(true)),
                "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        };

        cast.ok_or_else(|| AdapterError::Typecast {
            property: self.name.clone(),
            kind: self.kind.to_string(),
            value: raw.to_string(),
        })
    }

    /// Coerces a locally assigned value into this property's type.
    ///
    /// NaN and infinities have no wire form and are rejected.
    pub fn coerce(&self, value: Value) -> Result<Value, AdapterError> {
        if let Value::Float(x) = value {
            if !x.is_finite() {
                return Err(AdapterError::Typecast {
                    property: self.name.clone(),
                    kind: self.kind.to_string(),
                    value: x.to_string(),
                });
            }
        }
        self.typecast(&serde_json::Value::from(&value))
    }
}

/// `x` as an `i64` when it is a whole number inside the `i64` range.
fn whole(x: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = x >= i64::MIN as f64 && x < i64::MAX as f64;
    (in_range && x.fract() == 0.0).then_some(x as i64)
}

/// Property metadata for one resource type.
#[derive(Debug)]
pub struct Model {
    name: String,
    storage_name: String,
    properties: Vec<Property>,
    by_name: HashMap<String, usize>,
    by_field: HashMap<String, usize>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the record element in remote payloads (e.g. `heffalump`).
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.by_name.get(name).map(|&i| &self.properties[i])
    }

    pub fn property_by_field(&self, field: &str) -> Option<&Property> {
        self.by_field.get(field).map(|&i| &self.properties[i])
    }

    pub fn key(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.key)
    }

    /// Builds the payload identifying one record from raw key values.
    pub fn key_message(&self, keys: &[Value]) -> Result<Message, AdapterError> {
        let key: Vec<&Property> = self.key().collect();
        if key.len() != keys.len() {
            return Err(AdapterError::KeyArity {
                model: self.name.clone(),
                expected: key.len(),
                given: keys.len(),
            });
        }
        let mut message = Message::new();
        for (property, value) in key.into_iter().zip(keys) {
            if value.is_nil() {
                return Err(AdapterError::MissingKey {
                    model: self.name.clone(),
                    property: property.name.clone(),
                });
            }
            let value = property.coerce(value.clone())?;
            message.insert(property.field.clone(), value.into());
        }
        Ok(message)
    }

    fn position(&self, name: &str) -> Result<usize, AdapterError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| AdapterError::UnknownProperty {
                model: self.name.clone(),
                property: name.to_string(),
            })
    }
}

/// Builder for [`Model`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    storage_name: Option<String>,
    properties: Vec<Property>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_name: None,
            properties: Vec::new(),
        }
    }

    /// Defaults to the lowercased model name.
    pub fn storage_name(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = Some(storage_name.into());
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn build(self) -> Result<Arc<Model>, AdapterError> {
        let invalid = |reason: String| AdapterError::InvalidModel {
            model: self.name.clone(),
            reason,
        };

        if self.properties.is_empty() {
            return Err(invalid("no properties".into()));
        }
        if !self.properties.iter().any(|p| p.key) {
            return Err(invalid("no key property".into()));
        }

        let mut by_name = HashMap::with_capacity(self.properties.len());
        let mut by_field = HashMap::with_capacity(self.properties.len());
        for (i, p) in self.properties.iter().enumerate() {
            if by_name.insert(p.name.clone(), i).is_some() {
                return Err(invalid(format!("duplicate property {}", p.name)));
            }
            if by_field.insert(p.field.clone(), i).is_some() {
                return Err(invalid(format!("duplicate wire field {}", p.field)));
            }
        }

        let storage_name = self
            .storage_name
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase());

        Ok(Arc::new(Model {
            name: self.name,
            storage_name,
            properties: self.properties,
            by_name,
            by_field,
        }))
    }
}

/// One instance of a [`Model`].
#[derive(Debug, Clone)]
pub struct Resource {
    model: Arc<Model>,
    values: Vec<Value>,
}

impl Resource {
    /// A resource with every property nil.
    pub fn new(model: Arc<Model>) -> Self {
        let values = vec![Value::Nil; model.properties.len()];
        Self { model, values }
    }

    /// Builder-style [`Resource::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, AdapterError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Value of the named property, or `None` if the model has no such property.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.model.by_name.get(name).map(|&i| &self.values[i])
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), AdapterError> {
        let i = self.model.position(name)?;
        self.values[i] = self.model.properties[i].coerce(value.into())?;
        Ok(())
    }

    /// Sets the property mapped to a wire field from a raw wire value.
    ///
    /// Returns `Ok(false)` when the model has no property for `field`.
    pub fn set_field(&mut self, field: &str, raw: &serde_json::Value) -> Result<bool, AdapterError> {
        let Some(&i) = self.model.by_field.get(field) else {
            return Ok(false);
        };
        self.values[i] = self.model.properties[i].typecast(raw)?;
        Ok(true)
    }

    /// Every property as a wire payload, nil values included.
    pub fn attributes(&self) -> Message {
        self.model
            .properties
            .iter()
            .zip(&self.values)
            .map(|(p, v)| (p.field.clone(), serde_json::Value::from(v)))
            .collect()
    }

    /// Key values in key-property order.
    pub fn key(&self) -> Vec<&Value> {
        self.model
            .properties
            .iter()
            .zip(&self.values)
            .filter(|(p, _)| p.key)
            .map(|(_, v)| v)
            .collect()
    }

    /// Payload identifying this resource remotely.
    pub fn key_message(&self) -> Result<Message, AdapterError> {
        let key: Vec<Value> = self.key().into_iter().cloned().collect();
        self.model.key_message(&key)
    }

    /// True until every key property has a value.
    pub fn is_new(&self) -> bool {
        self.key().iter().any(|v| v.is_nil())
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.model.name == other.model.name && self.values == other.values
    }
}
