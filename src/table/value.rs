//! Cell values stored in attribute tables
//!
//! Every vertex and edge attribute is one of these variants; a column holds
//! values of a single variant plus `Null`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::column::ColumnType;

/// Dynamically typed attribute value
///
/// Supports:
/// - Integer (i64)
/// - Float (f64)
/// - String
/// - Boolean
/// - Null (missing cell)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    #[default]
    Null,
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value; integers are widened
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Column type this value belongs to (`None` for null)
    pub fn column_type(&self) -> Option<ColumnType> {
        ColumnType::of(self)
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Null => "Null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}

// Convenience conversions
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Hashable projection of a [`Value`], used for identity lookups, joins and grouping.
///
/// Floats are keyed by their bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKey {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(u64),
    String(String),
}

impl From<&Value> for ValueKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Integer(i) => ValueKey::Integer(*i),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::String(s) => ValueKey::String(s.clone()),
            Value::Boolean(b) => ValueKey::Boolean(*b),
            Value::Null => ValueKey::Null,
        }
    }
}

impl From<ValueKey> for Value {
    fn from(key: ValueKey) -> Self {
        match key {
            ValueKey::Integer(i) => Value::Integer(i),
            ValueKey::Float(bits) => Value::Float(f64::from_bits(bits)),
            ValueKey::String(s) => Value::String(s),
            ValueKey::Boolean(b) => Value::Boolean(b),
            ValueKey::Null => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Integer(42).type_name(), "Integer");
        assert_eq!(Value::Float(3.5).type_name(), "Float");
        assert_eq!(Value::String("x".to_string()).type_name(), "String");
        assert_eq!(Value::Boolean(true).type_name(), "Boolean");
        assert_eq!(Value::Null.type_name(), "Null");
        assert_eq!(Value::Null.column_type(), None);
        assert_eq!(Value::Integer(1).column_type(), Some(ColumnType::Integer));
    }

    #[test]
    fn test_value_conversions() {
        let s: Value = "hello".into();
        assert_eq!(s.as_string(), Some("hello"));

        let i: Value = 42i64.into();
        assert_eq!(i.as_integer(), Some(42));
        // integers read as floats
        assert_eq!(i.as_float(), Some(42.0));

        let b: Value = true.into();
        assert_eq!(b.as_boolean(), Some(true));

        let missing: Value = Option::<i64>::None.into();
        assert!(missing.is_null());
    }

    #[test]
    fn test_value_key_roundtrip() {
        let key = ValueKey::from(&Value::Float(1.5));
        assert_eq!(Value::from(key), Value::Float(1.5));
        assert_eq!(ValueKey::from(&Value::from(3)), ValueKey::Integer(3));
        assert_ne!(ValueKey::from(&Value::from(3)), ValueKey::from(&Value::from("3")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(Value::from(7).to_string(), "7");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
