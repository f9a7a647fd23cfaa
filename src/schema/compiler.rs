//! # Type Schema Compiler
//!
//! Compiles a [`TypeExpr`] into an immutable [`TypeSchema`] node and caches
//! it process-wide, keyed by descriptor identity. Compilation happens once
//! per distinct descriptor; concurrent first-use races are tolerated by
//! computing outside the lock and publishing with insert-if-absent, so the
//! loser discards its redundant copy and adopts the published one.
//!
//! Malformed generics never fail: a generic whose arity does not match its
//! origin degrades to a plain node and is treated as an opaque value.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use super::types::{ContainerKind, Origin, TypeExpr, TypeSchema};

static SCHEMA_CACHE: OnceLock<RwLock<HashMap<TypeExpr, Arc<TypeSchema>>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<TypeExpr, Arc<TypeSchema>>> {
    SCHEMA_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Compiles a descriptor, consulting the process-wide cache first.
pub fn compile_type_schema(expr: &TypeExpr) -> Arc<TypeSchema> {
    if let Ok(guard) = cache().read() {
        if let Some(node) = guard.get(expr) {
            return Arc::clone(node);
        }
    }

    let node = Arc::new(build(expr));
    tracing::trace!(descriptor = %node.repr, "compiled type schema");

    match cache().write() {
        Ok(mut guard) => Arc::clone(guard.entry(expr.clone()).or_insert(node)),
        // Poisoned lock: serve the uncached copy rather than fail.
        Err(_) => node,
    }
}

fn build(expr: &TypeExpr) -> TypeSchema {
    let repr = expr.to_string();
    match expr {
        TypeExpr::Generic { origin, args } => {
            let compiled: Vec<Arc<TypeSchema>> =
                args.iter().map(|arg| compile_type_schema(arg)).collect();
            let container_kind = classify(*origin, compiled.len());
            let is_optional = container_kind == ContainerKind::Union
                && compiled.iter().any(|arg| arg.declared == TypeExpr::Null);
            let inner_model = inner_model_of(container_kind, &compiled);
            TypeSchema {
                declared: expr.clone(),
                container_kind,
                args: compiled,
                is_optional,
                is_model: false,
                inner_model,
                repr,
            }
        }
        TypeExpr::Model(name) => TypeSchema {
            declared: expr.clone(),
            container_kind: ContainerKind::None,
            args: Vec::new(),
            is_optional: false,
            is_model: true,
            inner_model: Some(name.clone()),
            repr,
        },
        leaf => TypeSchema {
            declared: leaf.clone(),
            container_kind: ContainerKind::None,
            args: Vec::new(),
            is_optional: false,
            is_model: false,
            inner_model: None,
            repr,
        },
    }
}

fn classify(origin: Origin, arity: usize) -> ContainerKind {
    match origin {
        Origin::List if arity == 1 => ContainerKind::List,
        Origin::Set if arity == 1 => ContainerKind::Set,
        Origin::Dict if arity == 2 => ContainerKind::Dict,
        Origin::Tuple if arity >= 1 => ContainerKind::Tuple,
        Origin::Union if arity >= 1 => ContainerKind::Union,
        _ => ContainerKind::None,
    }
}

/// The model name a container or union resolves through, when unambiguous.
fn inner_model_of(container_kind: ContainerKind, args: &[Arc<TypeSchema>]) -> Option<String> {
    match container_kind {
        ContainerKind::List | ContainerKind::Set => args[0].inner_model.clone(),
        ContainerKind::Dict => args[1].inner_model.clone(),
        ContainerKind::Union => {
            let models: Vec<&String> = args
                .iter()
                .filter(|arg| arg.is_model)
                .filter_map(|arg| arg.inner_model.as_ref())
                .collect();
            match models.as_slice() {
                [single] => Some((*single).clone()),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_compiles_plain() {
        let node = compile_type_schema(&TypeExpr::Int);
        assert_eq!(node.container_kind, ContainerKind::None);
        assert!(node.args.is_empty());
        assert!(!node.is_optional);
        assert_eq!(node.repr, "int");
    }

    #[test]
    fn test_cache_returns_shared_node() {
        let a = compile_type_schema(&TypeExpr::list_of(TypeExpr::Float));
        let b = compile_type_schema(&TypeExpr::list_of(TypeExpr::Float));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_union_with_null_is_optional() {
        let node = compile_type_schema(&TypeExpr::optional(TypeExpr::Str));
        assert_eq!(node.container_kind, ContainerKind::Union);
        assert!(node.is_optional);
        assert_eq!(node.args.len(), 2);
    }

    #[test]
    fn test_union_without_null_is_not_optional() {
        let node =
            compile_type_schema(&TypeExpr::union_of(vec![TypeExpr::Int, TypeExpr::Str]));
        assert!(!node.is_optional);
    }

    #[test]
    fn test_union_records_single_model_alternative() {
        let node = compile_type_schema(&TypeExpr::optional(TypeExpr::model("Address")));
        assert_eq!(node.inner_model.as_deref(), Some("Address"));

        let ambiguous = compile_type_schema(&TypeExpr::union_of(vec![
            TypeExpr::model("A"),
            TypeExpr::model("B"),
        ]));
        assert_eq!(ambiguous.inner_model, None);
    }

    #[test]
    fn test_malformed_arity_degrades_to_plain() {
        let node = compile_type_schema(&TypeExpr::Generic {
            origin: Origin::Dict,
            args: vec![TypeExpr::Str],
        });
        assert_eq!(node.container_kind, ContainerKind::None);

        let node = compile_type_schema(&TypeExpr::Generic {
            origin: Origin::List,
            args: vec![TypeExpr::Int, TypeExpr::Int],
        });
        assert_eq!(node.container_kind, ContainerKind::None);
    }

    #[test]
    fn test_model_leaf_carries_its_name() {
        let node = compile_type_schema(&TypeExpr::model("User"));
        assert!(node.is_model);
        assert_eq!(node.inner_model.as_deref(), Some("User"));
        assert_eq!(node.container_kind, ContainerKind::None);
    }

    #[test]
    fn test_dict_records_value_model() {
        let node = compile_type_schema(&TypeExpr::dict_of(
            TypeExpr::Str,
            TypeExpr::model("Address"),
        ));
        assert_eq!(node.container_kind, ContainerKind::Dict);
        assert_eq!(node.inner_model.as_deref(), Some("Address"));
    }
}
