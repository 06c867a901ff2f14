//! Cache Value Module
//!
//! The caller-facing value model: scalars, ordered lists and records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// == Type Tag ==
/// Shape of a stored value, recorded in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Scalar,
    List,
    Record,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Scalar => "scalar",
            TypeTag::List => "list",
            TypeTag::Record => "record",
        };
        f.write_str(name)
    }
}

// == Value ==
/// A cacheable value.
///
/// Serialized untagged; the variant order matters for decoding, since
/// integers must be tried before floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the envelope tag for this value's shape.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::List(_) => TypeTag::List,
            Value::Record(_) => TypeTag::Record,
            _ => TypeTag::Scalar,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns false if any float anywhere in the value is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            Value::List(items) => items.iter().all(Value::is_finite),
            Value::Record(fields) => fields.values().all(Value::is_finite),
            _ => true,
        }
    }

    /// Returns true if lists and records nest deeper than `max` levels.
    ///
    /// A scalar has depth 0. The walk stops as soon as the limit is crossed.
    pub fn nests_deeper_than(&self, max: usize) -> bool {
        let is_container = matches!(self, Value::List(_) | Value::Record(_));
        let Some(rest) = max.checked_sub(1) else {
            return is_container;
        };
        match self {
            Value::List(items) => items.iter().any(|item| item.nests_deeper_than(rest)),
            Value::Record(fields) => fields.values().any(|field| field.nests_deeper_than(rest)),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Record(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        assert_eq!(Value::from(1).type_tag(), TypeTag::Scalar);
        assert_eq!(Value::from("a").type_tag(), TypeTag::Scalar);
        assert_eq!(Value::Null.type_tag(), TypeTag::Scalar);
        assert_eq!(Value::from(vec![1]).type_tag(), TypeTag::List);
        assert_eq!(Value::Record(BTreeMap::new()).type_tag(), TypeTag::Record);
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::from(7).as_i64(), Some(7));
        assert_eq!(Value::from(7).as_f64(), Some(7.0));
        assert_eq!(Value::from(2.5).as_i64(), None);
        assert!(!Value::from("7").is_numeric());
    }

    #[test]
    fn test_is_finite_checks_nested_floats() {
        let mut fields = BTreeMap::new();
        fields.insert("bad".to_string(), Value::List(vec![Value::Float(f64::NAN)]));
        assert!(!Value::Record(fields).is_finite());
        assert!(Value::from(vec![1.5, 2.5]).is_finite());
    }

    #[test]
    fn test_integers_and_floats_stay_distinct_in_json() {
        let json = serde_json::to_string(&Value::from(vec![Value::Int(2), Value::Float(2.0)])).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::List(vec![Value::Int(2), Value::Float(2.0)]));
    }

    #[test]
    fn test_nesting_depth() {
        let mut value = Value::from(1);
        assert!(!value.nests_deeper_than(0));

        for _ in 0..3 {
            value = Value::List(vec![value]);
        }
        assert!(!value.nests_deeper_than(3));
        assert!(value.nests_deeper_than(2));
        assert!(Value::Record(BTreeMap::new()).nests_deeper_than(0));
    }
}
