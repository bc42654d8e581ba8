//! Flat attribute values and the canonical serialization rule.
//!
//! Every setter on a record funnels through [`AttrValue`]: scalars keep
//! their natural representation, everything else becomes its canonical
//! JSON string. The backend distinguishes "unset" from "empty", so the
//! rule here never invents values for absent fields.

use serde::{Deserialize, Serialize};

/// A single exported attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrArray(Vec<String>),
}

impl AttrValue {
    /// Convert any serializable value: JSON primitives pass through as
    /// scalars, arrays and objects become their canonical JSON string.
    ///
    /// Serialization failures degrade to a placeholder string so telemetry
    /// never fails the instrumented call path.
    pub fn canonical<T: Serialize + ?Sized>(value: &T) -> AttrValue {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::String(s)) => AttrValue::Str(s),
            Ok(serde_json::Value::Bool(b)) => AttrValue::Bool(b),
            Ok(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(i) => AttrValue::Int(i),
                None => AttrValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Ok(other) => AttrValue::Str(other.to_string()),
            Err(_) => AttrValue::Str("<not serializable>".to_string()),
        }
    }

    /// The value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::StrArray(v)
    }
}
