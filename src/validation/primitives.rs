//! # Plain-Value Validation
//!
//! The leaf path of the engine: identity first, then the deserializer
//! registry, then the primitive coercions, then registered opaque
//! constructors. A conversion is accepted only when its result genuinely is
//! the declared kind; a deserializer producing anything else silently falls
//! through.

use crate::error::ErrorCollector;
use crate::schema::{DeserializerTable, TypeExpr, TypeSchema};
use crate::value::Value;

use super::Validator;

impl Validator<'_> {
    pub(super) fn validate_plain(
        &self,
        value: &Value,
        node: &TypeSchema,
        collector: &mut ErrorCollector,
        path: &str,
        deserializer: &DeserializerTable,
    ) -> Option<Value> {
        if leaf_matches(value, &node.declared) {
            return Some(value.clone());
        }

        if let Some(target) = node.target_key() {
            if let Some(convert) = deserializer.get(&target, &value.type_key()) {
                if let Some(converted) = convert(value) {
                    if converted.type_key() == target {
                        return Some(converted);
                    }
                }
            }
        }

        let converted = match &node.declared {
            TypeExpr::Int => coerce_int(value),
            TypeExpr::Float => coerce_float(value),
            TypeExpr::Str => coerce_str(value),
            TypeExpr::Bool => coerce_bool(value),
            TypeExpr::Opaque(name) => self.registry().construct_opaque(name, value),
            _ => None,
        };

        match converted {
            Some(converted) => Some(converted),
            None => {
                collector.add_error(
                    path,
                    format!("Expected type {}, got {}", node.repr, value.kind_name()),
                );
                None
            }
        }
    }
}

/// Exact runtime-kind test, no coercion.
fn leaf_matches(value: &Value, declared: &TypeExpr) -> bool {
    match declared {
        TypeExpr::Null => value.is_null(),
        TypeExpr::Bool => matches!(value, Value::Bool(_)),
        TypeExpr::Int => matches!(value, Value::Int(_)),
        TypeExpr::Float => matches!(value, Value::Float(_)),
        TypeExpr::Str => matches!(value, Value::Str(_)),
        TypeExpr::Model(name) => {
            matches!(value, Value::Model(instance) if instance.model_name() == name)
        }
        TypeExpr::Opaque(name) => {
            matches!(value, Value::Host(host) if host.type_name() == name)
        }
        TypeExpr::Any | TypeExpr::Generic { .. } => false,
    }
}

fn coerce_int(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_finite() => Some(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<Value> {
    match value {
        Value::Int(n) => Some(Value::Float(*n as f64)),
        Value::Bool(b) => Some(Value::Float(f64::from(i32::from(*b)))),
        Value::Str(s) => s.trim().parse::<f64>().ok().map(Value::Float),
        _ => None,
    }
}

/// Scalars only: containers, null, and host objects do not stringify.
fn coerce_str(value: &Value) -> Option<Value> {
    match value {
        Value::Int(n) => Some(Value::Str(n.to_string())),
        Value::Float(f) => Some(Value::Str(f.to_string())),
        Value::Bool(b) => Some(Value::Str(b.to_string())),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Int(0) => Some(Value::Bool(false)),
        Value::Int(1) => Some(Value::Bool(true)),
        Value::Str(s) if s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
        Value::Str(s) if s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
        _ => None,
    }
}
