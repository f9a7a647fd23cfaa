//! # Value-Tree Codec
//!
//! Renders an instance into an ordered mapping. At every node the model's
//! dict-serializer override for the value's runtime type is consulted
//! first; without one, models render as nested mappings through their own
//! schema's overrides, containers recurse, and everything else (host
//! objects included) passes through unchanged.

use indexmap::IndexMap;

use crate::error::ModelResult;
use crate::model::ModelInstance;
use crate::schema::{ModelRegistry, SerializerTable};
use crate::value::Value;

/// Renders `instance` into an ordered field mapping.
pub fn to_value_tree(
    registry: &ModelRegistry,
    instance: &ModelInstance,
) -> ModelResult<IndexMap<String, Value>> {
    let schema = registry.schema(instance.model_name())?;
    let serializer = &schema.config().dict_serializer;
    let mut tree = IndexMap::with_capacity(instance.fields().len());
    for (name, value) in instance.fields() {
        tree.insert(name.clone(), render(registry, value, serializer)?);
    }
    Ok(tree)
}

/// Constructs an instance from a field mapping; the inverse of
/// [`to_value_tree`] up to coercion.
pub fn from_value_tree(
    registry: &ModelRegistry,
    name: &str,
    tree: IndexMap<String, Value>,
) -> ModelResult<ModelInstance> {
    registry.construct(name, tree)
}

fn render(
    registry: &ModelRegistry,
    value: &Value,
    serializer: &SerializerTable,
) -> ModelResult<Value> {
    if let Some(convert) = serializer.get(&value.type_key()) {
        return Ok(convert(value));
    }
    match value {
        Value::Model(instance) => Ok(Value::Map(to_value_tree(registry, instance)?)),
        Value::Seq(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(render(registry, item, serializer)?);
            }
            Ok(Value::Seq(rendered))
        }
        Value::Map(entries) => {
            let mut rendered = IndexMap::with_capacity(entries.len());
            for (key, entry) in entries {
                rendered.insert(key.clone(), render(registry, entry, serializer)?);
            }
            Ok(Value::Map(rendered))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Config, ModelDescriptor, SerializerTable, TypeExpr};
    use crate::value::{HostObject, Timestamp, TypeKey};
    use std::sync::Arc;

    #[test]
    fn test_round_trip_canonicalizes() {
        let registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("User")
                    .field("name", TypeExpr::Str)
                    .field("age", TypeExpr::Int),
            )
            .unwrap();

        let mut input = IndexMap::new();
        input.insert("name".to_string(), Value::Str("alice".into()));
        input.insert("age".to_string(), Value::Str("30".into()));

        let instance = registry.construct("User", input).unwrap();
        let tree = to_value_tree(&registry, &instance).unwrap();
        assert_eq!(tree["age"], Value::Int(30));

        let again = from_value_tree(&registry, "User", tree.clone()).unwrap();
        let tree_again = to_value_tree(&registry, &again).unwrap();
        assert_eq!(tree, tree_again);
    }

    #[test]
    fn test_nested_models_render_as_mappings() {
        let registry = ModelRegistry::new();
        registry
            .register(ModelDescriptor::new("Address").field("street", TypeExpr::Str))
            .unwrap();
        registry
            .register(
                ModelDescriptor::new("User")
                    .field("name", TypeExpr::Str)
                    .field("address", TypeExpr::model("Address")),
            )
            .unwrap();

        let mut address = IndexMap::new();
        address.insert("street".to_string(), Value::Str("Main St".into()));
        let mut input = IndexMap::new();
        input.insert("name".to_string(), Value::Str("alice".into()));
        input.insert("address".to_string(), Value::Map(address));

        let instance = registry.construct("User", input).unwrap();
        let tree = to_value_tree(&registry, &instance).unwrap();
        let nested = tree["address"].as_map().unwrap();
        assert_eq!(nested["street"], Value::Str("Main St".into()));
    }

    #[test]
    fn test_host_objects_pass_through_without_override() {
        let registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("Event").field("at", TypeExpr::opaque(Timestamp::TYPE_NAME)),
            )
            .unwrap();

        let mut input = IndexMap::new();
        input.insert("at".to_string(), Value::Int(1_700_000_000));
        let instance = registry.construct("Event", input).unwrap();

        let tree = to_value_tree(&registry, &instance).unwrap();
        assert!(matches!(tree["at"], Value::Host(_)));
    }

    #[test]
    fn test_dict_serializer_override_applies() {
        let mut dict_serializer = SerializerTable::new();
        dict_serializer.insert(
            TypeKey::Host(Timestamp::TYPE_NAME.to_string()),
            Arc::new(|value| match value {
                Value::Host(host) => host.render(),
                other => other.clone(),
            }),
        );
        let registry = ModelRegistry::new();
        registry
            .register(
                ModelDescriptor::new("Event")
                    .field("at", TypeExpr::opaque(Timestamp::TYPE_NAME))
                    .config(Config {
                        dict_serializer,
                        ..Config::default()
                    }),
            )
            .unwrap();

        let mut input = IndexMap::new();
        input.insert("at".to_string(), Value::Str("2024-01-15T10:30:00Z".into()));
        let instance = registry.construct("Event", input).unwrap();

        let tree = to_value_tree(&registry, &instance).unwrap();
        assert!(matches!(tree["at"], Value::Str(_)));
    }
}
