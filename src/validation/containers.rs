//! # Container Validation
//!
//! The list, dict, tuple, set, and union paths of the engine. Containers
//! recurse per element with indexed/keyed paths and abort the whole
//! container when any element fails; the union path is two-pass (exact
//! shape first, coercion second), both in declaration order.

use crate::error::ErrorCollector;
use crate::schema::{ContainerKind, DeserializerTable, TypeExpr, TypeSchema};
use crate::value::Value;

use super::{child_path, Validator};

impl Validator<'_> {
    pub(super) fn validate_list(
        &self,
        value: &Value,
        node: &TypeSchema,
        collector: &mut ErrorCollector,
        path: &str,
        deserializer: &DeserializerTable,
    ) -> Option<Value> {
        let Some(items) = value.as_seq() else {
            collector.add_error(path, format!("Expected a list, got {}", value.kind_name()));
            return None;
        };
        let element = &node.args[0];
        let mut converted = Vec::with_capacity(items.len());
        let mut failed = false;
        for (index, item) in items.iter().enumerate() {
            let item_path = child_path(path, &index.to_string());
            match self.validate_and_convert(item, element, collector, &item_path, deserializer) {
                Some(item) => converted.push(item),
                None => failed = true,
            }
        }
        if failed {
            None
        } else {
            Some(Value::Seq(converted))
        }
    }

    pub(super) fn validate_dict(
        &self,
        value: &Value,
        node: &TypeSchema,
        collector: &mut ErrorCollector,
        path: &str,
        deserializer: &DeserializerTable,
    ) -> Option<Value> {
        let Some(entries) = value.as_map() else {
            collector.add_error(path, format!("Expected a dict, got {}", value.kind_name()));
            return None;
        };
        let key_schema = &node.args[0];
        let value_schema = &node.args[1];
        let mut converted = indexmap::IndexMap::with_capacity(entries.len());
        let mut failed = false;
        for (key, entry) in entries {
            let entry_path = child_path(path, key);
            let key_value = Value::Str(key.clone());
            let converted_key = match self.validate_and_convert(
                &key_value,
                key_schema,
                collector,
                &entry_path,
                deserializer,
            ) {
                Some(k) => canonical_key(&k, key),
                None => {
                    failed = true;
                    continue;
                }
            };
            match self.validate_and_convert(entry, value_schema, collector, &entry_path, deserializer)
            {
                Some(v) => {
                    converted.insert(converted_key, v);
                }
                None => failed = true,
            }
        }
        if failed {
            None
        } else {
            Some(Value::Map(converted))
        }
    }

    pub(super) fn validate_tuple(
        &self,
        value: &Value,
        node: &TypeSchema,
        collector: &mut ErrorCollector,
        path: &str,
        deserializer: &DeserializerTable,
    ) -> Option<Value> {
        let Some(items) = value.as_seq() else {
            collector.add_error(path, format!("Expected a tuple, got {}", value.kind_name()));
            return None;
        };
        if items.len() != node.args.len() {
            collector.add_error(
                path,
                format!(
                    "Expected tuple of length {}, got {}",
                    node.args.len(),
                    items.len()
                ),
            );
            return None;
        }
        let mut converted = Vec::with_capacity(items.len());
        let mut failed = false;
        for (index, (item, slot)) in items.iter().zip(&node.args).enumerate() {
            let item_path = child_path(path, &index.to_string());
            match self.validate_and_convert(item, slot, collector, &item_path, deserializer) {
                Some(item) => converted.push(item),
                None => failed = true,
            }
        }
        if failed {
            None
        } else {
            Some(Value::Seq(converted))
        }
    }

    /// Sets are carried as sequences; elements validate against the single
    /// element schema and equal elements collapse. Output order is not part
    /// of the contract.
    pub(super) fn validate_set(
        &self,
        value: &Value,
        node: &TypeSchema,
        collector: &mut ErrorCollector,
        path: &str,
        deserializer: &DeserializerTable,
    ) -> Option<Value> {
        let Some(items) = value.as_seq() else {
            collector.add_error(path, format!("Expected a set, got {}", value.kind_name()));
            return None;
        };
        let element = &node.args[0];
        let mut converted: Vec<Value> = Vec::with_capacity(items.len());
        let mut failed = false;
        for (index, item) in items.iter().enumerate() {
            let item_path = child_path(path, &index.to_string());
            match self.validate_and_convert(item, element, collector, &item_path, deserializer) {
                Some(item) => {
                    if !converted.contains(&item) {
                        converted.push(item);
                    }
                }
                None => failed = true,
            }
        }
        if failed {
            None
        } else {
            Some(Value::Seq(converted))
        }
    }

    /// Two-pass union resolution, both passes in declaration order.
    ///
    /// Pass one accepts the first alternative whose shape the value already
    /// has, with no coercion and no element inspection. Pass two retries
    /// each alternative with full validation against a scratch collector;
    /// the first success wins and the scratch errors are discarded.
    pub(super) fn validate_union(
        &self,
        value: &Value,
        node: &TypeSchema,
        collector: &mut ErrorCollector,
        path: &str,
        deserializer: &DeserializerTable,
    ) -> Option<Value> {
        for candidate in &node.args {
            if shape_matches(value, candidate) {
                return Some(value.clone());
            }
        }
        // A mapping against a union whose single model alternative is known
        // goes straight to nested construction, so its sub-errors reach the
        // caller instead of dying in a scratch collector.
        if node.inner_model.is_some() {
            if let Value::Map(input) = value {
                return self.construct_nested(node, input, collector, path);
            }
        }
        for candidate in &node.args {
            let mut scratch = ErrorCollector::new();
            if let Some(converted) =
                self.validate_and_convert(value, candidate, &mut scratch, path, deserializer)
            {
                return Some(converted);
            }
        }
        collector.add_error(
            path,
            format!(
                "Value did not match any candidate in Union: got {}",
                value.kind_name()
            ),
        );
        None
    }
}

/// Exact shape test for union pass one: container origin or leaf runtime
/// kind, no element inspection, no coercion.
fn shape_matches(value: &Value, node: &TypeSchema) -> bool {
    match node.container_kind {
        ContainerKind::List | ContainerKind::Set => matches!(value, Value::Seq(_)),
        ContainerKind::Tuple => {
            matches!(value, Value::Seq(items) if items.len() == node.args.len())
        }
        ContainerKind::Dict => matches!(value, Value::Map(_)),
        ContainerKind::Union => node.args.iter().any(|arg| shape_matches(value, arg)),
        ContainerKind::None => match &node.declared {
            TypeExpr::Null => value.is_null(),
            TypeExpr::Bool => matches!(value, Value::Bool(_)),
            TypeExpr::Int => matches!(value, Value::Int(_)),
            TypeExpr::Float => matches!(value, Value::Float(_)),
            TypeExpr::Str => matches!(value, Value::Str(_)),
            TypeExpr::Any => true,
            TypeExpr::Model(name) => {
                matches!(value, Value::Model(instance) if instance.model_name() == name)
            }
            TypeExpr::Opaque(name) => {
                matches!(value, Value::Host(host) if host.type_name() == name)
            }
            TypeExpr::Generic { .. } => false,
        },
    }
}

/// Canonical string form of a coerced dict key.
fn canonical_key(converted: &Value, original: &str) -> String {
    match converted {
        Value::Str(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => original.to_string(),
    }
}
