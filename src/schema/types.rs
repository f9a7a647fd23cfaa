//! # Schema Types
//!
//! Type descriptors and their compiled form. A [`TypeExpr`] is the declared
//! shape of a field (the annotation); a [`TypeSchema`] is the normalized,
//! cacheable node the validation engine walks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::value::TypeKey;

/// Container origin of a generic type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    List,
    Dict,
    Tuple,
    Set,
    Union,
}

/// A declared type shape.
///
/// `Model` refers to a registered model by name and is a leaf here: the
/// reference resolves through the registry at validation time, which is what
/// lets self-referential models compile without a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeExpr {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Any,
    Model(String),
    Opaque(String),
    Generic { origin: Origin, args: Vec<TypeExpr> },
}

impl TypeExpr {
    pub fn model(name: impl Into<String>) -> Self {
        TypeExpr::Model(name.into())
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        TypeExpr::Opaque(name.into())
    }

    pub fn list_of(element: TypeExpr) -> Self {
        TypeExpr::Generic {
            origin: Origin::List,
            args: vec![element],
        }
    }

    pub fn dict_of(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Generic {
            origin: Origin::Dict,
            args: vec![key, value],
        }
    }

    pub fn tuple_of(elements: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic {
            origin: Origin::Tuple,
            args: elements,
        }
    }

    pub fn set_of(element: TypeExpr) -> Self {
        TypeExpr::Generic {
            origin: Origin::Set,
            args: vec![element],
        }
    }

    pub fn union_of(alternatives: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic {
            origin: Origin::Union,
            args: alternatives,
        }
    }

    /// `T | None`
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::union_of(vec![inner, TypeExpr::Null])
    }

    /// Type key of a leaf descriptor, used for deserializer target lookup.
    /// Generic descriptors have no single key.
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            TypeExpr::Null => Some(TypeKey::Null),
            TypeExpr::Bool => Some(TypeKey::Bool),
            TypeExpr::Int => Some(TypeKey::Int),
            TypeExpr::Float => Some(TypeKey::Float),
            TypeExpr::Str => Some(TypeKey::Str),
            TypeExpr::Model(name) => Some(TypeKey::Model(name.clone())),
            TypeExpr::Opaque(name) => Some(TypeKey::Host(name.clone())),
            TypeExpr::Any | TypeExpr::Generic { .. } => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Null => write!(f, "None"),
            TypeExpr::Bool => write!(f, "bool"),
            TypeExpr::Int => write!(f, "int"),
            TypeExpr::Float => write!(f, "float"),
            TypeExpr::Str => write!(f, "str"),
            TypeExpr::Any => write!(f, "Any"),
            TypeExpr::Model(name) | TypeExpr::Opaque(name) => write!(f, "{}", name),
            TypeExpr::Generic { origin, args } => {
                let joined = args.iter().map(TypeExpr::to_string).collect::<Vec<_>>();
                match origin {
                    Origin::List => write!(f, "list[{}]", joined.join(", ")),
                    Origin::Dict => write!(f, "dict[{}]", joined.join(", ")),
                    Origin::Tuple => write!(f, "tuple[{}]", joined.join(", ")),
                    Origin::Set => write!(f, "set[{}]", joined.join(", ")),
                    Origin::Union => write!(f, "{}", joined.join(" | ")),
                }
            }
        }
    }
}

/// Validation strategy of a compiled node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Plain value: identity, deserializer, coercion, constructor.
    None,
    List,
    Dict,
    Tuple,
    Set,
    Union,
}

/// A compiled, immutable type schema node.
///
/// Nodes are published once to a process-wide cache and shared via `Arc`;
/// container nodes hold fully compiled children, leaves hold none.
#[derive(Debug)]
pub struct TypeSchema {
    /// The descriptor this node was compiled from.
    pub declared: TypeExpr,
    pub container_kind: ContainerKind,
    /// Child nodes, in declaration order.
    pub args: Vec<Arc<TypeSchema>>,
    /// True for unions with a `None` alternative.
    pub is_optional: bool,
    /// True when the node itself refers to a registered model.
    pub is_model: bool,
    /// The model name this node resolves through, when one is determined:
    /// the node's own model, a container's element or value model, or the
    /// single non-null model alternative of a union.
    pub inner_model: Option<String>,
    /// Cached display form used in error messages.
    pub repr: String,
}

impl TypeSchema {
    /// Deserializer target key for plain-path lookups.
    pub fn target_key(&self) -> Option<TypeKey> {
        self.declared.type_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(TypeExpr::Int.to_string(), "int");
        assert_eq!(TypeExpr::list_of(TypeExpr::Int).to_string(), "list[int]");
        assert_eq!(
            TypeExpr::dict_of(TypeExpr::Str, TypeExpr::Float).to_string(),
            "dict[str, float]"
        );
        assert_eq!(
            TypeExpr::tuple_of(vec![TypeExpr::Int, TypeExpr::Str]).to_string(),
            "tuple[int, str]"
        );
        assert_eq!(TypeExpr::optional(TypeExpr::Int).to_string(), "int | None");
        assert_eq!(TypeExpr::model("User").to_string(), "User");
    }

    #[test]
    fn test_descriptors_are_hashable_cache_keys() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(TypeExpr::list_of(TypeExpr::Int), 1);
        assert_eq!(map.get(&TypeExpr::list_of(TypeExpr::Int)), Some(&1));
        assert_eq!(map.get(&TypeExpr::list_of(TypeExpr::Str)), None);
    }

    #[test]
    fn test_descriptors_serialize_round_trip() {
        let expr = TypeExpr::dict_of(TypeExpr::Str, TypeExpr::optional(TypeExpr::Int));
        let json = serde_json::to_string(&expr).unwrap();
        let back: TypeExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, back);
    }

    #[test]
    fn test_leaf_type_keys() {
        assert_eq!(TypeExpr::Int.type_key(), Some(TypeKey::Int));
        assert_eq!(
            TypeExpr::opaque("Timestamp").type_key(),
            Some(TypeKey::Host("Timestamp".into()))
        );
        assert_eq!(TypeExpr::list_of(TypeExpr::Int).type_key(), None);
    }
}
