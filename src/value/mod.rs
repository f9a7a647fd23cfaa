//! # Value Tree
//!
//! The dynamically-typed value representation the engine validates and
//! coerces. A `Value` is either a JSON-like scalar/container, a constructed
//! model instance, or an opaque host object behind the [`HostObject`] trait.

mod timestamp;

pub use timestamp::Timestamp;

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::model::ModelInstance;

/// An opaque value the engine carries without inspecting its structure.
///
/// Host objects participate in validation only through the deserializer
/// registry and registered constructors. `render` produces a plain value
/// tree used as the serialization fallback and must not itself return a
/// `Value::Host`.
pub trait HostObject: fmt::Debug + Send + Sync {
    /// Type name used for registry lookups and error messages.
    fn type_name(&self) -> &str;

    /// Plain value-tree rendering (serialization fallback).
    fn render(&self) -> Value;

    /// Dynamic equality against another host object.
    fn eq_dyn(&self, other: &dyn HostObject) -> bool;

    /// Downcast support for concrete host types.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// A dynamically-typed value.
///
/// Mappings preserve insertion order and have unique string keys. Cloning is
/// a deep structural copy except for host objects, which share their `Arc`.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),
    Model(Box<ModelInstance>),
    Host(Arc<dyn HostObject>),
}

/// Runtime type identity of a value or of a leaf declared type.
///
/// Keys the deserializer registry's exact-pair lookup and the serializer
/// override tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Seq,
    Map,
    Model(String),
    Host(String),
}

impl Value {
    /// Returns the runtime type key of this value.
    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Null => TypeKey::Null,
            Value::Bool(_) => TypeKey::Bool,
            Value::Int(_) => TypeKey::Int,
            Value::Float(_) => TypeKey::Float,
            Value::Str(_) => TypeKey::Str,
            Value::Seq(_) => TypeKey::Seq,
            Value::Map(_) => TypeKey::Map,
            Value::Model(m) => TypeKey::Model(m.model_name().to_string()),
            Value::Host(h) => TypeKey::Host(h.type_name().to_string()),
        }
    }

    /// Human-readable kind name used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Seq(_) => "list".to_string(),
            Value::Map(_) => "dict".to_string(),
            Value::Model(m) => m.model_name().to_string(),
            Value::Host(h) => h.type_name().to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Builds a value tree from parsed JSON. Integral numbers map to `Int`,
    /// everything else numeric to `Float`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Seq(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Plain JSON rendering with no serializer overrides. Model instances
    /// become objects of their fields, host objects render structurally,
    /// non-finite floats fall back to their decimal text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => serde_json::Value::String(f.to_string()),
            },
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Seq(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Model(m) => serde_json::Value::Object(
                m.fields()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Host(h) => h.render().to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Model(a), Value::Model(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a.eq_dyn(b.as_ref()),
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}
