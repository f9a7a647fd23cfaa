//! # JSON Text Codec
//!
//! Parsing guards reject empty input, malformed syntax, and non-object
//! roots before construction runs. Writing walks the instance: models
//! become objects in field order, containers recurse, scalars write
//! natively; other values try the model's json-serializer override, then
//! the host rendering.

use crate::error::{ModelError, ModelResult};
use crate::model::ModelInstance;
use crate::schema::{ModelRegistry, SerializerTable};
use crate::value::{HostObject, Value};

/// Parses JSON text and constructs an instance of `name` from it.
pub fn from_json(registry: &ModelRegistry, name: &str, text: &str) -> ModelResult<ModelInstance> {
    if text.trim().is_empty() {
        return Err(ModelError::Parse("Empty JSON string".to_string()));
    }
    let parsed: serde_json::Value = serde_json::from_str(text)
        .map_err(|err| ModelError::Parse(format!("JSON parse error: {}", err)))?;
    if !parsed.is_object() {
        return Err(ModelError::Parse("JSON root must be an object".to_string()));
    }
    match Value::from_json(&parsed) {
        Value::Map(input) => registry.construct(name, input),
        _ => Err(ModelError::Parse("JSON root must be an object".to_string())),
    }
}

/// Renders an instance as a JSON string.
pub fn to_json(registry: &ModelRegistry, instance: &ModelInstance) -> ModelResult<String> {
    let schema = registry.schema(instance.model_name())?;
    let serializer = &schema.config().json_serializer;
    let rendered = write_instance(instance, serializer);
    serde_json::to_string(&rendered)
        .map_err(|err| ModelError::Parse(format!("JSON write error: {}", err)))
}

fn write_instance(instance: &ModelInstance, serializer: &SerializerTable) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (name, value) in instance.fields() {
        object.insert(name.clone(), write_value(value, serializer));
    }
    serde_json::Value::Object(object)
}

fn write_value(value: &Value, serializer: &SerializerTable) -> serde_json::Value {
    match value {
        // Containers and models recurse structurally; overrides apply to
        // the leaves inside them.
        Value::Model(instance) => write_instance(instance, serializer),
        Value::Seq(items) => serde_json::Value::Array(
            items.iter().map(|item| write_value(item, serializer)).collect(),
        ),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(key, entry)| (key.clone(), write_value(entry, serializer)))
                .collect(),
        ),
        other => {
            if let Some(convert) = serializer.get(&other.type_key()) {
                let converted = convert(other);
                // One substitution per node; the result writes structurally.
                return converted.to_json();
            }
            match other {
                Value::Host(host) => host.render().to_json(),
                scalar => scalar.to_json(),
            }
        }
    }
}
