//! # Validation Engine
//!
//! The recursive validate-and-convert walk. Given a value and a compiled
//! type schema node it either produces the conforming (possibly coerced)
//! value or records path-qualified errors into the collector and produces
//! nothing. It never panics and never fails fast; fail-fast behavior
//! belongs to the validator pipeline.

mod containers;
mod primitives;
mod validators;

pub use validators::{FieldHook, ModelAfterHook, ModelBeforeHook, ValidatorSet};

use crate::error::{ErrorCollector, ModelError};
use crate::schema::{ContainerKind, DeserializerTable, ModelRegistry, TypeExpr, TypeSchema};
use crate::value::Value;

/// The engine. Borrows the registry so nested model references resolve by
/// name at validation time.
pub struct Validator<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Validator { registry }
    }

    pub(crate) fn registry(&self) -> &'a ModelRegistry {
        self.registry
    }

    /// Validates `value` against `node`, recording errors under `path`.
    ///
    /// Returns the conforming value, or `None` with at least one error
    /// recorded at `path` (or below it, for containers and nested models).
    pub fn validate_and_convert(
        &self,
        value: &Value,
        node: &TypeSchema,
        collector: &mut ErrorCollector,
        path: &str,
        deserializer: &DeserializerTable,
    ) -> Option<Value> {
        // Null against an optional type needs no further inspection.
        if value.is_null() && node.is_optional {
            return Some(Value::Null);
        }
        if node.declared == TypeExpr::Any {
            return Some(value.clone());
        }
        if node.is_model {
            if let Value::Map(input) = value {
                return self.construct_nested(node, input, collector, path);
            }
            // Anything else falls through to the plain path, where an
            // already-constructed instance passes by identity.
        }

        match node.container_kind {
            ContainerKind::List => self.validate_list(value, node, collector, path, deserializer),
            ContainerKind::Dict => self.validate_dict(value, node, collector, path, deserializer),
            ContainerKind::Tuple => self.validate_tuple(value, node, collector, path, deserializer),
            ContainerKind::Set => self.validate_set(value, node, collector, path, deserializer),
            ContainerKind::Union => self.validate_union(value, node, collector, path, deserializer),
            ContainerKind::None => self.validate_plain(value, node, collector, path, deserializer),
        }
    }

    /// Constructs a nested model from a mapping. A failed construction is
    /// attached whole under `path`: validation trees merge as sub-errors,
    /// anything else becomes a single message.
    fn construct_nested(
        &self,
        node: &TypeSchema,
        input: &indexmap::IndexMap<String, Value>,
        collector: &mut ErrorCollector,
        path: &str,
    ) -> Option<Value> {
        let Some(name) = node.inner_model.as_deref() else {
            collector.add_error(path, format!("Expected type {}, got dict", node.repr));
            return None;
        };
        match self.registry.construct(name, input.clone()) {
            Ok(instance) => Some(Value::Model(Box::new(instance))),
            Err(ModelError::Validation(tree)) => {
                collector.add_suberror(path, &tree.to_json_string());
                None
            }
            Err(other) => {
                collector.add_error(path, other.to_string());
                None
            }
        }
    }
}

/// Child path for a container element or mapping key.
pub(crate) fn child_path(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::compile_type_schema;

    fn run(value: &Value, expr: &TypeExpr) -> (Option<Value>, Option<crate::error::ErrorTree>) {
        let registry = ModelRegistry::new();
        let node = compile_type_schema(expr);
        let table = DeserializerTable::with_defaults();
        let mut collector = ErrorCollector::new();
        let result = Validator::new(&registry)
            .validate_and_convert(value, &node, &mut collector, "field", &table);
        (result, collector.into_tree())
    }

    #[test]
    fn test_null_against_optional_short_circuits() {
        let (result, errors) = run(&Value::Null, &TypeExpr::optional(TypeExpr::Int));
        assert_eq!(result, Some(Value::Null));
        assert!(errors.is_none());
    }

    #[test]
    fn test_null_against_required_leaf_fails() {
        let (result, errors) = run(&Value::Null, &TypeExpr::Int);
        assert!(result.is_none());
        assert!(errors.is_some());
    }

    #[test]
    fn test_any_passes_everything_unchanged() {
        for value in [
            Value::Null,
            Value::Int(5),
            Value::Str("x".into()),
            Value::Seq(vec![Value::Bool(true)]),
        ] {
            let (result, errors) = run(&value, &TypeExpr::Any);
            assert_eq!(result, Some(value));
            assert!(errors.is_none());
        }
    }

    #[test]
    fn test_unknown_model_reports_under_path() {
        let mut input = indexmap::IndexMap::new();
        input.insert("x".to_string(), Value::Int(1));
        let (result, errors) = run(&Value::Map(input), &TypeExpr::model("Ghost"));
        assert!(result.is_none());
        let tree = errors.unwrap();
        assert_eq!(
            tree.to_json(),
            serde_json::json!({"field": "Unknown model 'Ghost'"})
        );
    }
}
