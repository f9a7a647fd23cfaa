//! # Conversion Tables
//!
//! Closure tables keyed by runtime type identity. The deserializer table is
//! consulted on the plain-value path before structural coercion; the
//! serializer tables override how a runtime type renders in the dict and
//! JSON codecs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::{Timestamp, TypeKey, Value};

/// Converts a source value into the target type; `None` means "not mine",
/// the caller silently falls through to the next strategy.
pub type DeserializeFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Renders a value in place of its structural form.
pub type SerializeFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// (target type, source type) -> conversion. Exact-pair lookup only; there
/// is no subtype or fallback chain.
#[derive(Clone, Default)]
pub struct DeserializerTable {
    entries: HashMap<(TypeKey, TypeKey), DeserializeFn>,
}

impl DeserializerTable {
    pub fn new() -> Self {
        DeserializerTable {
            entries: HashMap::new(),
        }
    }

    /// The global defaults: `Timestamp` from an RFC 3339 string and from
    /// whole unix seconds.
    pub fn with_defaults() -> Self {
        let mut table = DeserializerTable::new();
        let target = TypeKey::Host(Timestamp::TYPE_NAME.to_string());
        table.insert(
            target.clone(),
            TypeKey::Str,
            Arc::new(|value| {
                value
                    .as_str()
                    .and_then(Timestamp::parse)
                    .map(|ts| Value::Host(Arc::new(ts)))
            }),
        );
        table.insert(
            target,
            TypeKey::Int,
            Arc::new(|value| {
                value
                    .as_int()
                    .and_then(Timestamp::from_unix)
                    .map(|ts| Value::Host(Arc::new(ts)))
            }),
        );
        table
    }

    pub fn insert(&mut self, target: TypeKey, source: TypeKey, conversion: DeserializeFn) {
        self.entries.insert((target, source), conversion);
    }

    pub fn get(&self, target: &TypeKey, source: &TypeKey) -> Option<&DeserializeFn> {
        self.entries.get(&(target.clone(), source.clone()))
    }

    /// Overlays `other` on top of this table; colliding pairs take the
    /// incoming conversion.
    pub fn extend(&mut self, other: &DeserializerTable) {
        for (key, conversion) in &other.entries {
            self.entries.insert(key.clone(), Arc::clone(conversion));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for DeserializerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeserializerTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Runtime type -> rendering override, used by the dict and JSON codecs.
#[derive(Clone, Default)]
pub struct SerializerTable {
    entries: HashMap<TypeKey, SerializeFn>,
}

impl SerializerTable {
    pub fn new() -> Self {
        SerializerTable {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: TypeKey, rendering: SerializeFn) {
        self.entries.insert(key, rendering);
    }

    pub fn get(&self, key: &TypeKey) -> Option<&SerializeFn> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for SerializerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pair_lookup_only() {
        let table = DeserializerTable::with_defaults();
        let target = TypeKey::Host(Timestamp::TYPE_NAME.to_string());
        assert!(table.get(&target, &TypeKey::Str).is_some());
        assert!(table.get(&target, &TypeKey::Int).is_some());
        assert!(table.get(&target, &TypeKey::Float).is_none());
        assert!(table.get(&TypeKey::Int, &TypeKey::Str).is_none());
    }

    #[test]
    fn test_default_timestamp_from_string() {
        let table = DeserializerTable::with_defaults();
        let target = TypeKey::Host(Timestamp::TYPE_NAME.to_string());
        let convert = table.get(&target, &TypeKey::Str).unwrap();

        let converted = convert(&Value::Str("2024-01-15T10:30:00Z".into())).unwrap();
        assert_eq!(converted.kind_name(), "Timestamp");

        assert!(convert(&Value::Str("garbage".into())).is_none());
    }

    #[test]
    fn test_default_timestamp_from_unix_seconds() {
        let table = DeserializerTable::with_defaults();
        let target = TypeKey::Host(Timestamp::TYPE_NAME.to_string());
        let convert = table.get(&target, &TypeKey::Int).unwrap();
        assert!(convert(&Value::Int(1_700_000_000)).is_some());
    }

    #[test]
    fn test_extend_overrides_colliding_pairs() {
        let mut table = DeserializerTable::with_defaults();
        let before = table.len();

        let mut overlay = DeserializerTable::new();
        let target = TypeKey::Host(Timestamp::TYPE_NAME.to_string());
        overlay.insert(target.clone(), TypeKey::Str, Arc::new(|_| None));
        table.extend(&overlay);

        assert_eq!(table.len(), before);
        let convert = table.get(&target, &TypeKey::Str).unwrap();
        assert!(convert(&Value::Str("2024-01-15T10:30:00Z".into())).is_none());
    }
}
