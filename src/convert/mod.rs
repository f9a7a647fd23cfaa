//! # Codecs
//!
//! The value-tree codec (instance to and from an ordered mapping) and the
//! JSON text codec, both honoring per-model serializer overrides.

mod dict;
mod json;

pub use dict::{from_value_tree, to_value_tree};
pub use json::{from_json, to_json};
