//! Backend attribute encoding
//!
//! Items in the backing tables are maps of typed attributes. On the wire (in
//! template output) each attribute is a single-entry map naming its type:
//! `{"S": "text"}`, `{"N": "20"}`, `{"BOOL": true}`, `{"NULL": true}`,
//! `{"L": [...]}`, `{"M": {...}}`.

use crate::value::{Map, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    Bool(bool),
    Null,
    L(Vec<AttributeValue>),
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Encode a plain value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => AttributeValue::N(n.to_string()),
            Value::String(s) => AttributeValue::S(s.clone()),
            Value::List(items) => AttributeValue::L(items.iter().map(Self::from_value).collect()),
            Value::Map(map) => AttributeValue::M(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect(),
            ),
        }
    }

    /// Decode back into a plain value.
    pub fn to_value(&self) -> Value {
        match self {
            AttributeValue::S(s) => Value::String(s.clone()),
            AttributeValue::N(n) => serde_json::from_str::<serde_json::Number>(n)
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(n.clone())),
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Null => Value::Null,
            AttributeValue::L(items) => Value::List(items.iter().map(Self::to_value).collect()),
            AttributeValue::M(map) => {
                Value::Map(map.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
            }
        }
    }

    /// Wire form as produced by `toEncoded(...)`.
    pub fn to_wire(&self) -> Value {
        let (tag, inner) = match self {
            AttributeValue::S(s) => ("S", Value::String(s.clone())),
            AttributeValue::N(n) => ("N", Value::String(n.clone())),
            AttributeValue::Bool(b) => ("BOOL", Value::Bool(*b)),
            AttributeValue::Null => ("NULL", Value::Bool(true)),
            AttributeValue::L(items) => ("L", Value::List(items.iter().map(Self::to_wire).collect())),
            AttributeValue::M(map) => (
                "M",
                Value::Map(map.iter().map(|(k, v)| (k.clone(), v.to_wire())).collect()),
            ),
        };
        let mut wire = Map::new();
        wire.insert(tag.to_string(), inner);
        Value::Map(wire)
    }

    /// Parse the wire form; the error names what was wrong.
    pub fn from_wire(wire: &Value) -> Result<Self, String> {
        let map = wire
            .as_map()
            .ok_or_else(|| format!("encoded attribute must be a map, got {}", wire.kind_name()))?;
        if map.len() != 1 {
            return Err(format!(
                "encoded attribute must have exactly one type tag, got {}",
                map.len()
            ));
        }
        let (tag, inner) = map
            .iter()
            .next()
            .ok_or_else(|| "encoded attribute is empty".to_string())?;
        match (tag.as_str(), inner) {
            ("S", Value::String(s)) => Ok(AttributeValue::S(s.clone())),
            ("N", Value::String(n)) => {
                serde_json::from_str::<serde_json::Number>(n)
                    .map_err(|_| format!("'{}' is not a number", n))?;
                Ok(AttributeValue::N(n.clone()))
            }
            ("BOOL", Value::Bool(b)) => Ok(AttributeValue::Bool(*b)),
            ("NULL", Value::Bool(true)) => Ok(AttributeValue::Null),
            ("L", Value::List(items)) => items
                .iter()
                .map(Self::from_wire)
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::L),
            ("M", Value::Map(entries)) => entries
                .iter()
                .map(|(k, v)| Self::from_wire(v).map(|a| (k.clone(), a)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(AttributeValue::M),
            (tag, inner) => Err(format!(
                "invalid encoded attribute: tag '{}' with {} payload",
                tag,
                inner.kind_name()
            )),
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }
}

/// Decode a whole item map of wire attributes.
pub fn item_from_wire(wire: &Value) -> Result<BTreeMap<String, AttributeValue>, String> {
    let map = wire
        .as_map()
        .ok_or_else(|| format!("attribute map expected, got {}", wire.kind_name()))?;
    map.iter()
        .map(|(name, v)| {
            AttributeValue::from_wire(v)
                .map(|a| (name.clone(), a))
                .map_err(|e| format!("attribute '{}': {}", name, e))
        })
        .collect()
}

/// Plain-value view of a stored item.
pub fn item_to_value(item: &BTreeMap<String, AttributeValue>) -> Value {
    Value::Map(item.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
}
