//! Typed model values
//!
//! [`ModelValue`] is the tagged union stored in resource attributes and
//! operation parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Type tag of a [`ModelValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelType {
    /// No value
    Undefined,
    /// `true` / `false`
    Boolean,
    /// 64-bit signed integer
    Int,
    /// UTF-8 string
    String,
    /// Ordered list of values
    List,
    /// Named values
    Object,
    /// Unresolved `${...}` placeholder
    Expression,
}

impl Display for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelType::Undefined => "UNDEFINED",
            ModelType::Boolean => "BOOLEAN",
            ModelType::Int => "INT",
            ModelType::String => "STRING",
            ModelType::List => "LIST",
            ModelType::Object => "OBJECT",
            ModelType::Expression => "EXPRESSION",
        };
        f.write_str(name)
    }
}

/// A value in the management model
///
/// JSON mapping: `null` is [`ModelValue::Undefined`]; strings containing a
/// `${...}` placeholder become [`ModelValue::Expression`]; numbers that do not
/// fit an `i64` are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum ModelValue {
    /// No value
    #[default]
    Undefined,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Int(i64),
    /// String value
    String(String),
    /// List value
    List(Vec<ModelValue>),
    /// Object value
    Object(BTreeMap<String, ModelValue>),
    /// Unresolved expression, kept verbatim
    Expression(String),
}

impl ModelValue {
    /// Build a string value, turning `${...}` placeholders into an expression
    #[must_use]
    pub fn parse_string(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if is_expression_string(&raw) {
            ModelValue::Expression(raw)
        } else {
            ModelValue::String(raw)
        }
    }

    /// Build an expression value
    #[inline]
    #[must_use]
    pub fn expression(raw: impl Into<String>) -> Self {
        ModelValue::Expression(raw.into())
    }

    /// Type tag
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        match self {
            ModelValue::Undefined => ModelType::Undefined,
            ModelValue::Boolean(_) => ModelType::Boolean,
            ModelValue::Int(_) => ModelType::Int,
            ModelValue::String(_) => ModelType::String,
            ModelValue::List(_) => ModelType::List,
            ModelValue::Object(_) => ModelType::Object,
            ModelValue::Expression(_) => ModelType::Expression,
        }
    }

    /// Check if the value is defined
    #[inline]
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !matches!(self, ModelValue::Undefined)
    }

    /// Check if the value is an unresolved expression
    #[inline]
    #[must_use]
    pub fn is_expression(&self) -> bool {
        matches!(self, ModelValue::Expression(_))
    }

    /// Borrow string content of `String` and `Expression` values
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModelValue::String(s) | ModelValue::Expression(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, converting numeric strings
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ModelValue::Int(i) => Some(*i),
            ModelValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view, converting `"true"` / `"false"` strings
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ModelValue::Boolean(b) => Some(*b),
            ModelValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// List view
    #[must_use]
    pub fn as_list(&self) -> Option<&[ModelValue]> {
        match self {
            ModelValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Object view
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, ModelValue>> {
        match self {
            ModelValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Lookup a field of an object value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModelValue> {
        self.as_object().and_then(|fields| fields.get(key))
    }

    /// Check if an object value has a defined field
    #[must_use]
    pub fn has_defined(&self, key: &str) -> bool {
        self.get(key).is_some_and(ModelValue::is_defined)
    }

    /// Convert to JSON
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.clone().into()
    }
}

/// Check if a raw string holds a `${...}` placeholder
#[must_use]
pub fn is_expression_string(raw: &str) -> bool {
    raw.find("${")
        .is_some_and(|start| raw[start + 2..].contains('}'))
}

impl Display for ModelValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelValue::Undefined => f.write_str("undefined"),
            ModelValue::Boolean(b) => write!(f, "{b}"),
            ModelValue::Int(i) => write!(f, "{i}"),
            ModelValue::String(s) | ModelValue::Expression(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for ModelValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ModelValue::Undefined,
            Value::Bool(b) => ModelValue::Boolean(b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| ModelValue::String(n.to_string()), ModelValue::Int),
            Value::String(s) => ModelValue::parse_string(s),
            Value::Array(items) => ModelValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(fields) => ModelValue::Object(
                fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<ModelValue> for serde_json::Value {
    fn from(value: ModelValue) -> Self {
        use serde_json::Value;
        match value {
            ModelValue::Undefined => Value::Null,
            ModelValue::Boolean(b) => Value::Bool(b),
            ModelValue::Int(i) => Value::from(i),
            ModelValue::String(s) | ModelValue::Expression(s) => Value::String(s),
            ModelValue::List(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            ModelValue::Object(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<bool> for ModelValue {
    fn from(value: bool) -> Self {
        ModelValue::Boolean(value)
    }
}

impl From<i64> for ModelValue {
    fn from(value: i64) -> Self {
        ModelValue::Int(value)
    }
}

impl From<i32> for ModelValue {
    fn from(value: i32) -> Self {
        ModelValue::Int(i64::from(value))
    }
}

impl From<&str> for ModelValue {
    fn from(value: &str) -> Self {
        ModelValue::parse_string(value)
    }
}

impl From<String> for ModelValue {
    fn from(value: String) -> Self {
        ModelValue::parse_string(value)
    }
}

impl<T: Into<ModelValue>> From<Vec<T>> for ModelValue {
    fn from(items: Vec<T>) -> Self {
        ModelValue::List(items.into_iter().map(Into::into).collect())
    }
}
