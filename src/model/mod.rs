//! # Model Instances
//!
//! The constructed record: an ordered field store tagged with its model
//! name, plus the construction state machine that fills it.
//!
//! Construction order: model pre-hooks, field pre-hooks, per-field
//! resolution (aliases, defaults) and coercion with fail-together error
//! collection, then field and model post-hooks. Hook failures abort
//! immediately; coercion failures are collected so every violation in one
//! input surfaces at once.

use indexmap::IndexMap;

use crate::error::{ErrorCollector, ModelError, ModelResult};
use crate::schema::{DefaultSpec, ModelRegistry, ModelSchema};
use crate::validation::Validator;
use crate::value::Value;

/// A constructed record instance.
///
/// Fields sit in schema declaration order. Cloning is a deep structural
/// copy; host objects share their `Arc`, so [`ModelInstance::deep_copy`] is
/// the same operation under a contract-bearing name.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    model: String,
    fields: IndexMap<String, Value>,
}

impl ModelInstance {
    pub(crate) fn new(model: String) -> Self {
        ModelInstance {
            model,
            fields: IndexMap::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Structural copy. Host objects are shared by reference, everything
    /// else is cloned.
    pub fn deep_copy(&self) -> ModelInstance {
        self.clone()
    }

    /// Raw write with no validation, for post-hooks and trusted callers.
    /// Validated assignment goes through `ModelRegistry::set_field`.
    pub fn insert(&mut self, name: &str, value: Value) {
        self.put_field(name, value);
    }

    /// Writes a field in place, preserving field order for existing names.
    pub(crate) fn put_field(&mut self, name: &str, value: Value) {
        match self.fields.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }

    /// Takes a field's value out, leaving its slot (and order) intact.
    pub(crate) fn take_field(&mut self, name: &str) -> Option<Value> {
        self.fields.get_mut(name).map(std::mem::take)
    }
}

/// Runs the full construction pipeline for one input mapping.
pub(crate) fn construct(
    registry: &ModelRegistry,
    schema: &ModelSchema,
    mut input: IndexMap<String, Value>,
) -> ModelResult<ModelInstance> {
    let model = schema.name();
    let validators = schema.validators();

    if schema.has_model_before() {
        validators
            .apply_model_before(model, &mut input)
            .map_err(ModelError::ValidatorFailed)?;
    }
    if schema.has_field_before() {
        validators
            .apply_field_before(model, &mut input)
            .map_err(ModelError::ValidatorFailed)?;
    }

    let engine = Validator::new(registry);
    let deserializer = &schema.config().deserializer;
    let mut collector = ErrorCollector::new();
    let mut instance = ModelInstance::new(model.to_string());

    for field in schema.fields() {
        let supplied = resolve_input(&mut input, &field.aliases, &field.name);
        let value = match supplied {
            Some(value) => value,
            None => match &field.default {
                DefaultSpec::Factory(factory) => match factory() {
                    Ok(value) => value,
                    Err(reason) => {
                        tracing::debug!(model, field = %field.name, %reason, "default factory failed");
                        collector.add_error(
                            &field.name,
                            "Missing required field and default factory call failed",
                        );
                        continue;
                    }
                },
                DefaultSpec::Value(value) => value.clone(),
                DefaultSpec::Required => {
                    if field.type_schema.is_optional {
                        Value::Null
                    } else {
                        collector.add_error(&field.name, "Missing required field");
                        continue;
                    }
                }
            },
        };

        match engine.validate_and_convert(
            &value,
            &field.type_schema,
            &mut collector,
            &field.name,
            deserializer,
        ) {
            Some(converted) => instance.put_field(&field.name, converted),
            // Keep the original value as a placeholder so later stages see
            // a complete store; the collected errors abort below.
            None => instance.put_field(&field.name, value),
        }
    }

    if let Some(tree) = collector.into_tree() {
        tracing::debug!(model, errors = tree.len(), "construction failed");
        return Err(ModelError::Validation(tree));
    }

    if schema.has_field_after() {
        validators
            .apply_field_after(model, &mut instance)
            .map_err(ModelError::ValidatorFailed)?;
    }
    if schema.has_model_after() {
        validators
            .apply_model_after(model, &mut instance)
            .map_err(ModelError::ValidatorFailed)?;
    }

    Ok(instance)
}

/// Alias-first input resolution: aliases in declaration order, then the
/// canonical name. The matched entry is removed from the input.
fn resolve_input(
    input: &mut IndexMap<String, Value>,
    aliases: &[String],
    name: &str,
) -> Option<Value> {
    for alias in aliases {
        if let Some(value) = input.swap_remove(alias) {
            return Some(value);
        }
    }
    input.swap_remove(name)
}

/// Validated assignment. Declared fields coerce through the field's type
/// schema unless the model opts out with `validate_on_set = false`;
/// undeclared names are stored directly.
pub(crate) fn set_field(
    registry: &ModelRegistry,
    instance: &mut ModelInstance,
    name: &str,
    value: Value,
) -> ModelResult<()> {
    let schema = registry.schema(instance.model_name())?;
    if !schema.config().validate_on_set {
        instance.put_field(name, value);
        return Ok(());
    }
    let Some(field) = schema.field(name) else {
        instance.put_field(name, value);
        return Ok(());
    };

    let mut collector = ErrorCollector::new();
    let engine = Validator::new(registry);
    match engine.validate_and_convert(
        &value,
        &field.type_schema,
        &mut collector,
        name,
        &schema.config().deserializer,
    ) {
        Some(converted) => {
            instance.put_field(name, converted);
            Ok(())
        }
        None => Err(ModelError::Validation(
            collector.into_tree().unwrap_or_default(),
        )),
    }
}
