//! # Model Schemas
//!
//! Declared model descriptors and their compiled form. A
//! [`ModelDescriptor`] is what user code builds (ordered fields with type
//! descriptors, defaults, aliases, config, validators); a [`ModelSchema`]
//! is the compiled artifact the registry caches: per-field compiled type
//! schemas, the deserializer table merged over the global defaults, and
//! precomputed has-any flags for the four validator stages.

use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::validation::ValidatorSet;
use crate::value::Value;

use super::compiler::compile_type_schema;
use super::deserializer::{DeserializerTable, SerializerTable};
use super::types::{TypeExpr, TypeSchema};

/// Zero-argument default factory. Failure text is reported under the field
/// path.
pub type FactoryFn = Arc<dyn Fn() -> Result<Value, String> + Send + Sync>;

/// Per-field declaration metadata.
///
/// A field with neither a default nor a factory is required. When both are
/// set, the factory takes precedence.
#[derive(Clone, Default)]
pub struct Field {
    default: Option<Value>,
    default_factory: Option<FactoryFn>,
    aliases: Vec<String>,
}

impl Field {
    pub fn new() -> Self {
        Field::default()
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Value, String> + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(factory));
        self
    }

    /// Appends one alias; aliases are tried before the canonical name, in
    /// the order they were added.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    fn default_spec(&self) -> DefaultSpec {
        if let Some(factory) = &self.default_factory {
            DefaultSpec::Factory(Arc::clone(factory))
        } else if let Some(value) = &self.default {
            DefaultSpec::Value(value.clone())
        } else {
            DefaultSpec::Required
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("default", &self.default)
            .field("has_factory", &self.default_factory.is_some())
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// Resolved absence behavior of a compiled field.
#[derive(Clone)]
pub enum DefaultSpec {
    Required,
    Value(Value),
    Factory(FactoryFn),
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::Required => write!(f, "Required"),
            DefaultSpec::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultSpec::Factory(_) => write!(f, "Factory"),
        }
    }
}

/// Per-model configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Validate assignments through `set_field` (on by default).
    pub validate_on_set: bool,
    /// Model-specific deserializers, overlaid on the global defaults at
    /// compile time.
    pub deserializer: DeserializerTable,
    /// Rendering overrides for the value-tree codec.
    pub dict_serializer: SerializerTable,
    /// Rendering overrides for the JSON text codec.
    pub json_serializer: SerializerTable,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            validate_on_set: true,
            deserializer: DeserializerTable::new(),
            dict_serializer: SerializerTable::new(),
            json_serializer: SerializerTable::new(),
        }
    }
}

/// A declared model: ordered fields plus config and validators.
#[derive(Debug)]
pub struct ModelDescriptor {
    name: String,
    fields: Vec<(String, TypeExpr, Field)>,
    config: Config,
    validators: ValidatorSet,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ModelDescriptor {
            name: name.into(),
            fields: Vec::new(),
            config: Config::default(),
            validators: ValidatorSet::default(),
        }
    }

    /// Declares a required field with no aliases.
    pub fn field(self, name: impl Into<String>, declared: TypeExpr) -> Self {
        self.field_with(name, declared, Field::new())
    }

    pub fn field_with(
        mut self,
        name: impl Into<String>,
        declared: TypeExpr,
        options: Field,
    ) -> Self {
        self.fields.push((name.into(), declared, options));
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn validators(mut self, validators: ValidatorSet) -> Self {
        self.validators = validators;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A compiled field: canonical name, alias order, resolved default, and the
/// shared type schema node.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub aliases: Vec<String>,
    pub default: DefaultSpec,
    pub type_schema: Arc<TypeSchema>,
}

/// The compiled, immutable model schema.
#[derive(Debug)]
pub struct ModelSchema {
    name: String,
    fields: Vec<FieldSchema>,
    config: Config,
    validators: ValidatorSet,
    has_field_before: bool,
    has_field_after: bool,
    has_model_before: bool,
    has_model_after: bool,
}

impl ModelSchema {
    /// Compiles a descriptor. Fails on duplicate field names; everything
    /// else is resolved leniently.
    pub(crate) fn compile(descriptor: &ModelDescriptor) -> ModelResult<ModelSchema> {
        let mut fields: Vec<FieldSchema> = Vec::with_capacity(descriptor.fields.len());
        for (name, declared, options) in &descriptor.fields {
            if fields.iter().any(|f| &f.name == name) {
                return Err(ModelError::SchemaCompile {
                    model: descriptor.name.clone(),
                    reason: format!("duplicate field '{}'", name),
                });
            }
            fields.push(FieldSchema {
                name: name.clone(),
                aliases: options.aliases.clone(),
                default: options.default_spec(),
                type_schema: compile_type_schema(declared),
            });
        }

        let mut config = descriptor.config.clone();
        let mut deserializer = DeserializerTable::with_defaults();
        deserializer.extend(&config.deserializer);
        config.deserializer = deserializer;

        let validators = descriptor.validators.clone();
        tracing::debug!(model = %descriptor.name, fields = fields.len(), "compiled model schema");

        Ok(ModelSchema {
            name: descriptor.name.clone(),
            has_field_before: validators.has_field_before(),
            has_field_after: validators.has_field_after(),
            has_model_before: validators.has_model_before(),
            has_model_after: validators.has_model_after(),
            fields,
            config,
            validators,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn has_field_before(&self) -> bool {
        self.has_field_before
    }

    pub fn has_field_after(&self) -> bool {
        self.has_field_after
    }

    pub fn has_model_before(&self) -> bool {
        self.has_model_before
    }

    pub fn has_model_after(&self) -> bool {
        self.has_model_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_is_the_default() {
        let field = Field::new();
        assert!(matches!(field.default_spec(), DefaultSpec::Required));
    }

    #[test]
    fn test_factory_takes_precedence_over_value() {
        let field = Field::new()
            .with_default(1i64)
            .with_factory(|| Ok(Value::Int(2)));
        assert!(matches!(field.default_spec(), DefaultSpec::Factory(_)));
    }

    #[test]
    fn test_compile_preserves_declaration_order() {
        let descriptor = ModelDescriptor::new("User")
            .field("name", TypeExpr::Str)
            .field("age", TypeExpr::Int)
            .field("email", TypeExpr::Str);
        let schema = ModelSchema::compile(&descriptor).unwrap();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "email"]);
    }

    #[test]
    fn test_compile_rejects_duplicate_fields() {
        let descriptor = ModelDescriptor::new("User")
            .field("name", TypeExpr::Str)
            .field("name", TypeExpr::Int);
        let err = ModelSchema::compile(&descriptor).unwrap_err();
        assert!(matches!(err, ModelError::SchemaCompile { .. }));
    }

    #[test]
    fn test_compile_merges_global_deserializers() {
        let descriptor = ModelDescriptor::new("Event").field("at", TypeExpr::Int);
        let schema = ModelSchema::compile(&descriptor).unwrap();
        // The global Timestamp defaults are always present.
        assert!(!schema.config().deserializer.is_empty());
    }

    #[test]
    fn test_alias_order_is_declaration_order() {
        let descriptor = ModelDescriptor::new("User").field_with(
            "name",
            TypeExpr::Str,
            Field::new().with_alias("full_name").with_alias("username"),
        );
        let schema = ModelSchema::compile(&descriptor).unwrap();
        assert_eq!(
            schema.field("name").unwrap().aliases,
            vec!["full_name", "username"]
        );
    }
}
