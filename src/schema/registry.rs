//! # Model Registry
//!
//! The process's directory of declared models and opaque host types.
//! Descriptors are immutable once registered; model schemas compile lazily
//! on first use and are cached per registry. The registry is shareable
//! across threads, with compile races resolved by insert-if-absent.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ModelError, ModelResult};
use crate::model::{self, ModelInstance};
use crate::value::{HostObject, Value};

use super::deserializer::DeserializeFn;
use super::model::{ModelDescriptor, ModelSchema};

/// Registry of model descriptors, compiled schemas, and opaque types.
#[derive(Default)]
pub struct ModelRegistry {
    descriptors: RwLock<HashMap<String, Arc<ModelDescriptor>>>,
    schemas: RwLock<HashMap<String, Arc<ModelSchema>>>,
    opaque: RwLock<HashMap<String, Option<DeserializeFn>>>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.count())
            .finish()
    }
}

fn read_guard<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_guard<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        ModelRegistry::default()
    }

    /// Registers a model descriptor. Names are unique; re-registration is
    /// rejected rather than replacing the published descriptor.
    pub fn register(&self, descriptor: ModelDescriptor) -> ModelResult<()> {
        let mut descriptors = write_guard(&self.descriptors);
        let name = descriptor.name().to_string();
        if descriptors.contains_key(&name) {
            return Err(ModelError::DuplicateModel(name));
        }
        tracing::debug!(model = %name, "registered model");
        descriptors.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Declares an opaque host type with no constructor; values must
    /// already be instances or come through a deserializer.
    pub fn register_opaque(&self, name: impl Into<String>) {
        write_guard(&self.opaque).insert(name.into(), None);
    }

    /// Declares an opaque host type with a constructor tried on the plain
    /// path after the deserializer registry.
    pub fn register_opaque_constructor(
        &self,
        name: impl Into<String>,
        constructor: DeserializeFn,
    ) {
        write_guard(&self.opaque).insert(name.into(), Some(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        read_guard(&self.descriptors).contains_key(name)
    }

    pub fn count(&self) -> usize {
        read_guard(&self.descriptors).len()
    }

    /// The compiled schema for a registered model, compiling and caching on
    /// first use. Concurrent first uses may compile twice; the first
    /// published copy wins and the loser is discarded.
    pub fn schema(&self, name: &str) -> ModelResult<Arc<ModelSchema>> {
        if let Some(schema) = read_guard(&self.schemas).get(name) {
            return Ok(Arc::clone(schema));
        }

        let descriptor = read_guard(&self.descriptors)
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))?;
        let compiled = Arc::new(ModelSchema::compile(&descriptor)?);

        let mut schemas = write_guard(&self.schemas);
        Ok(Arc::clone(
            schemas.entry(name.to_string()).or_insert(compiled),
        ))
    }

    /// Constructs an instance of `name` from an input mapping, running the
    /// full validation pipeline.
    pub fn construct(
        &self,
        name: &str,
        input: IndexMap<String, Value>,
    ) -> ModelResult<ModelInstance> {
        let schema = self.schema(name)?;
        model::construct(self, &schema, input)
    }

    /// Validated assignment on an existing instance.
    pub fn set_field(
        &self,
        instance: &mut ModelInstance,
        name: &str,
        value: Value,
    ) -> ModelResult<()> {
        model::set_field(self, instance, name, value)
    }

    /// Runs the registered constructor for an opaque type, accepting only a
    /// host value of that type.
    pub(crate) fn construct_opaque(&self, name: &str, value: &Value) -> Option<Value> {
        let constructor = read_guard(&self.opaque).get(name)?.clone()?;
        let constructed = constructor(value)?;
        match &constructed {
            Value::Host(host) if host.type_name() == name => Some(constructed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeExpr;
    use crate::value::Timestamp;

    fn user_descriptor() -> ModelDescriptor {
        ModelDescriptor::new("User")
            .field("name", TypeExpr::Str)
            .field("age", TypeExpr::Int)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ModelRegistry::new();
        assert_eq!(registry.count(), 0);
        registry.register(user_descriptor()).unwrap();
        assert!(registry.contains("User"));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let registry = ModelRegistry::new();
        registry.register(user_descriptor()).unwrap();
        let err = registry.register(user_descriptor()).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateModel(name) if name == "User"));
    }

    #[test]
    fn test_unknown_model_errors() {
        let registry = ModelRegistry::new();
        let err = registry.schema("Ghost").unwrap_err();
        assert!(matches!(err, ModelError::UnknownModel(name) if name == "Ghost"));
    }

    #[test]
    fn test_schema_is_compiled_once_and_shared() {
        let registry = ModelRegistry::new();
        registry.register(user_descriptor()).unwrap();
        let a = registry.schema("User").unwrap();
        let b = registry.schema("User").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_opaque_constructor_result_is_type_checked() {
        let registry = ModelRegistry::new();
        // A constructor that lies about its type is discarded.
        registry.register_opaque_constructor(
            "Currency",
            Arc::new(|value| value.as_str().map(|s| Value::Str(s.to_uppercase()))),
        );
        assert!(registry
            .construct_opaque("Currency", &Value::Str("usd".into()))
            .is_none());

        registry.register_opaque_constructor(
            Timestamp::TYPE_NAME,
            Arc::new(|value| {
                value
                    .as_int()
                    .and_then(Timestamp::from_unix)
                    .map(|ts| Value::Host(Arc::new(ts)))
            }),
        );
        let constructed = registry
            .construct_opaque(Timestamp::TYPE_NAME, &Value::Int(0))
            .unwrap();
        match constructed {
            Value::Host(host) => assert_eq!(host.type_name(), "Timestamp"),
            other => panic!("expected host, got {:?}", other),
        }
    }
}
