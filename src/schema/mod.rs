//! # Schema subsystem
//!
//! Type descriptors, the compiled schema graph, model declarations, and the
//! registry that ties them together.
//!
//! # Design Principles
//!
//! - Compile once, cache forever: type schemas per descriptor, model
//!   schemas per registry
//! - Published schemas are immutable and shared
//! - Malformed generic arity degrades to a plain type, never an error
//! - Registered descriptors cannot be replaced

mod compiler;
mod deserializer;
mod model;
mod registry;
mod types;

pub use compiler::compile_type_schema;
pub use deserializer::{DeserializeFn, DeserializerTable, SerializeFn, SerializerTable};
pub use model::{Config, DefaultSpec, FactoryFn, Field, FieldSchema, ModelDescriptor, ModelSchema};
pub use registry::ModelRegistry;
pub use types::{ContainerKind, Origin, TypeExpr, TypeSchema};
