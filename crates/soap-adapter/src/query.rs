//! # Queries and Query Translation
//!
//! A [`Query`] is a conjunction of [`Condition`]s over the properties of one
//! [`Model`], with an optional result limit. The remote "query all" operation
//! cannot take structured predicates, so a [`QueryTranslator`] flattens the query
//! into a plain [`Message`].
//!
//! The default [`FlatQueryTranslator`] produces a [`QueryMessage`]:
//!
//! ```json
//! {
//!   "conditions": [
//!     {"field": "spots", "operator": "range", "value": [1, 5]},
//!     {"field": "color", "operator": "eql", "value": null, "negated": true}
//!   ],
//!   "limit": 2
//! }
//! ```
//!
//! [`QueryMessage::matches`] evaluates that flat form against a record, so a
//! service sharing these types selects records exactly as the query describes.

use crate::error::AdapterError;
use crate::model::{Message, Model, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// What a [`Condition`] checks about a property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eql(Value),
    In(Vec<Value>),
    Range {
        from: Value,
        to: Value,
        exclusive: bool,
    },
    Like(String),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
}

/// A predicate on one named property, optionally negated.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    property: String,
    predicate: Predicate,
    negated: bool,
}

impl Condition {
    pub fn new(property: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            property: property.into(),
            predicate,
            negated: false,
        }
    }

    pub fn eql(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Predicate::Eql(value.into()))
    }

    pub fn one_of<V: Into<Value>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(
            property,
            Predicate::In(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `from <= value <= to`
    pub fn range(property: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self::new(
            property,
            Predicate::Range {
                from: from.into(),
                to: to.into(),
                exclusive: false,
            },
        )
    }

    /// `from <= value < to`
    pub fn range_exclusive(
        property: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Self::new(
            property,
            Predicate::Range {
                from: from.into(),
                to: to.into(),
                exclusive: true,
            },
        )
    }

    /// SQL-style pattern: `%` matches any run of characters, `_` exactly one.
    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(property, Predicate::Like(pattern.into()))
    }

    pub fn gt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Predicate::Gt(value.into()))
    }

    pub fn gte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Predicate::Gte(value.into()))
    }

    pub fn lt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Predicate::Lt(value.into()))
    }

    pub fn lte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Predicate::Lte(value.into()))
    }

    /// Selects exactly the records the condition would not.
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

/// A set of conditions over one model.
#[derive(Debug, Clone)]
pub struct Query {
    model: Arc<Model>,
    conditions: Vec<Condition>,
    limit: Option<usize>,
}

impl Query {
    /// Matches every record of `model`.
    pub fn all(model: Arc<Model>) -> Self {
        Self {
            model,
            conditions: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

// =============================================================================
// FLAT WIRE FORM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eql,
    In,
    Range,
    RangeExclusive,
    Like,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One condition keyed by wire field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "is_false")]
    pub negated: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FieldCondition {
    /// Evaluates the condition against a record keyed by wire field name.
    /// A missing field counts as nil.
    pub fn matches(&self, record: &Message) -> bool {
        let actual = record.get(&self.field).unwrap_or(&serde_json::Value::Null);
        self.evaluate(actual) != self.negated
    }

    fn evaluate(&self, actual: &serde_json::Value) -> bool {
        use serde_json::Value as Json;

        let bound = |i: usize| match &self.value {
            Json::Array(items) => items.get(i),
            _ => None,
        };
        let ordered = |accept: fn(Ordering) -> bool| {
            compare(actual, &self.value).is_some_and(accept)
        };

        match self.operator {
            Operator::Eql => scalar_eq(actual, &self.value),
            Operator::In => match &self.value {
                Json::Array(items) => items.iter().any(|item| scalar_eq(actual, item)),
                _ => false,
            },
            Operator::Range | Operator::RangeExclusive => {
                let (Some(from), Some(to)) = (bound(0), bound(1)) else {
                    return false;
                };
                let above = compare(actual, from).is_some_and(|o| o != Ordering::Less);
                let below = compare(actual, to).is_some_and(|o| match self.operator {
                    Operator::RangeExclusive => o == Ordering::Less,
                    _ => o != Ordering::Greater,
                });
                above && below
            }
            Operator::Like => match (as_text(actual), self.value.as_str()) {
                (Some(text), Some(pattern)) => like(&text, pattern),
                _ => false,
            },
            Operator::Gt => ordered(|o| o == Ordering::Greater),
            Operator::Gte => ordered(|o| o != Ordering::Less),
            Operator::Lt => ordered(|o| o == Ordering::Less),
            Operator::Lte => ordered(|o| o != Ordering::Greater),
        }
    }
}

/// Flat payload accepted by the remote "query all" operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMessage {
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl QueryMessage {
    pub fn from_message(message: &Message) -> Result<Self, AdapterError> {
        serde_json::from_value(serde_json::Value::Object(message.clone()))
            .map_err(|e| AdapterError::Parse(e.to_string()))
    }

    pub fn into_message(self) -> Message {
        let mut message = Message::new();
        message.insert(
            "conditions".into(),
            serde_json::Value::Array(
                self.conditions
                    .into_iter()
                    .map(|c| serde_json::to_value(c).unwrap_or_default())
                    .collect(),
            ),
        );
        if let Some(limit) = self.limit {
            message.insert("limit".into(), limit.into());
        }
        message
    }

    /// True when every condition holds for `record`.
    pub fn matches(&self, record: &Message) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

fn scalar_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    match (a.is_null(), b.is_null()) {
        (true, true) => true,
        (false, false) => compare(a, b) == Some(Ordering::Equal),
        _ => false,
    }
}

/// Orders two scalars. Numbers and booleans compare by value, even when one
/// side is carried as a string; nil and mismatched types are unordered.
fn compare(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    use serde_json::Value as Json;

    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Json::Number(x), Json::String(s)) => x.as_f64()?.partial_cmp(&s.trim().parse().ok()?),
        (Json::String(s), Json::Number(y)) => s.trim().parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        (Json::String(x), Json::String(y)) => Some(x.cmp(y)),
        (Json::Bool(x), Json::Bool(y)) => Some(x.cmp(y)),
        (Json::Bool(x), Json::String(s)) => Some(x.cmp(&parse_bool(s)?)),
        (Json::String(s), Json::Bool(y)) => Some(parse_bool(s)?.cmp(y)),
        _ => None,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matched[j]: pattern[..i] matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut any = false;
                for j in 0..=text.len() {
                    any |= matched[j];
                    next[j] = any;
                }
            }
            '_' => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1];
                }
            }
            c => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1] && text[j - 1] == *c;
                }
            }
        }
        matched = next;
    }
    matched[text.len()]
}

// =============================================================================
// TRANSLATION
// =============================================================================

/// Turns a [`Query`] into the payload of the remote "query all" operation.
pub trait QueryTranslator: Send + Sync {
    fn translate(&self, query: &Query) -> Result<Message, AdapterError>;
}

/// Produces a [`QueryMessage`] keyed by wire field names.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatQueryTranslator;

impl FlatQueryTranslator {
    fn condition(&self, model: &Model, condition: &Condition) -> Result<FieldCondition, AdapterError> {
        let property = model
            .property(condition.property())
            .ok_or_else(|| AdapterError::UnknownProperty {
                model: model.name().to_string(),
                property: condition.property().to_string(),
            })?;
        let cast = |v: &Value| -> Result<serde_json::Value, AdapterError> {
            Ok(property.coerce(v.clone())?.into())
        };

        let (operator, value) = match condition.predicate() {
            Predicate::Eql(v) => (Operator::Eql, cast(v)?),
            Predicate::In(vs) => (
                Operator::In,
                serde_json::Value::Array(vs.iter().map(cast).collect::<Result<_, _>>()?),
            ),
            Predicate::Range {
                from,
                to,
                exclusive,
            } => (
                if *exclusive {
                    Operator::RangeExclusive
                } else {
                    Operator::Range
                },
                serde_json::Value::Array(vec![cast(from)?, cast(to)?]),
            ),
            Predicate::Like(pattern) => (Operator::Like, serde_json::Value::from(pattern.as_str())),
            Predicate::Gt(v) => (Operator::Gt, cast(v)?),
            Predicate::Gte(v) => (Operator::Gte, cast(v)?),
            Predicate::Lt(v) => (Operator::Lt, cast(v)?),
            Predicate::Lte(v) => (Operator::Lte, cast(v)?),
        };

        Ok(FieldCondition {
            field: property.field_name().to_string(),
            operator,
            value,
            negated: condition.is_negated(),
        })
    }
}

impl QueryTranslator for FlatQueryTranslator {
    fn translate(&self, query: &Query) -> Result<Message, AdapterError> {
        let conditions = query
            .conditions()
            .iter()
            .map(|c| self.condition(query.model(), c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryMessage {
            conditions,
            limit: query.limit(),
        }
        .into_message())
    }
}
