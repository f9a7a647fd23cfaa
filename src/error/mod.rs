//! # Errors
//!
//! The crate-wide error taxonomy and the path-qualified error collector.
//!
//! Structural field failures (missing field, type mismatch, container shape,
//! union no-match, nested sub-errors) are never raised individually: they
//! accumulate in an [`ErrorTree`] so every violation in one construction
//! surfaces together. Only validator hooks, schema compilation, and text
//! parsing fail fast.

mod collector;

pub use collector::{ErrorCollector, ErrorEntry, ErrorTree};

use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors surfaced by schema compilation, construction, and codecs
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    // ==================
    // Registry Errors
    // ==================
    /// No descriptor registered under this name
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    /// Registered descriptors are immutable; re-registration is rejected
    #[error("Model '{0}' is already registered")]
    DuplicateModel(String),

    /// Descriptor could not be compiled into a model schema
    #[error("Could not compile schema for model '{model}': {reason}")]
    SchemaCompile { model: String, reason: String },

    // ==================
    // Validation Errors
    // ==================
    /// The collected fail-together report; Display renders the JSON tree
    #[error("{0}")]
    Validation(ErrorTree),

    /// A validator hook failed; aborts the construction immediately
    #[error("Validator failed: {0}")]
    ValidatorFailed(String),

    // ==================
    // Codec Errors
    // ==================
    /// JSON text could not be turned into a construction input
    #[error("{0}")]
    Parse(String),
}

impl ModelError {
    /// Returns the collected error tree for validation failures.
    pub fn validation_tree(&self) -> Option<&ErrorTree> {
        match self {
            ModelError::Validation(tree) => Some(tree),
            _ => None,
        }
    }
}
