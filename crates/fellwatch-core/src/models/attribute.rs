//! Normalized attribute values carried by observations and logging areas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute cell after coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Convert from a JSON property value; nested values are kept as JSON text
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Bool(*b),
            serde_json::Value::Number(n) => {
                n.as_f64().map(AttributeValue::Number).unwrap_or(AttributeValue::Null)
            }
            serde_json::Value::String(s) => AttributeValue::Text(s.clone()),
            other => AttributeValue::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttributeValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<Option<f64>> for AttributeValue {
    fn from(value: Option<f64>) -> Self {
        value.map(AttributeValue::Number).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"a": 1.5, "b": "x", "c": null, "d": true, "e": [1]});
        let obj = json.as_object().unwrap();
        assert_eq!(AttributeValue::from_json(&obj["a"]), AttributeValue::Number(1.5));
        assert_eq!(AttributeValue::from_json(&obj["b"]), AttributeValue::Text("x".into()));
        assert!(AttributeValue::from_json(&obj["c"]).is_null());
        assert_eq!(AttributeValue::from_json(&obj["d"]), AttributeValue::Bool(true));
        assert_eq!(AttributeValue::from_json(&obj["e"]), AttributeValue::Text("[1]".into()));
    }

    #[test]
    fn test_non_finite_number_serializes_as_null() {
        assert_eq!(AttributeValue::Number(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
