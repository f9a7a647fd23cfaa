//! datamold - A strict, schema-driven data validation and coercion engine
//!
//! Declared models (ordered fields with type shapes, defaults, aliases, and
//! lifecycle validators) compile once into cached schemas; arbitrary input
//! mappings are then validated, coerced, and assembled into instances with
//! path-qualified, fail-together error reporting.

pub mod convert;
pub mod error;
pub mod model;
pub mod schema;
pub mod validation;
pub mod value;

pub use convert::{from_json, from_value_tree, to_json, to_value_tree};
pub use error::{ErrorCollector, ErrorEntry, ErrorTree, ModelError, ModelResult};
pub use model::ModelInstance;
pub use schema::{
    Config, DeserializerTable, Field, ModelDescriptor, ModelRegistry, SerializerTable, TypeExpr,
};
pub use validation::{FieldHook, ModelAfterHook, ModelBeforeHook, ValidatorSet, Validator};
pub use value::{HostObject, Timestamp, TypeKey, Value};
