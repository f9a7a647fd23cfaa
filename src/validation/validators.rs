//! # Validator Pipeline
//!
//! Lifecycle hooks attached to a model: field-level and model-level, before
//! and after coercion. Each hook's capability (value-only or model-aware)
//! is chosen once at registration; nothing is introspected per call.
//!
//! A failing hook aborts the whole construction immediately, unlike field
//! coercion errors which are collected fail-together.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::model::ModelInstance;
use crate::value::Value;

type FieldValueFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;
type FieldModelFn = Arc<dyn Fn(&str, Value) -> Result<Value, String> + Send + Sync>;

/// A field-level hook: transforms one field's value before or after
/// coercion.
#[derive(Clone)]
pub enum FieldHook {
    Value(FieldValueFn),
    WithModel(FieldModelFn),
}

impl FieldHook {
    pub fn value<F>(hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        FieldHook::Value(Arc::new(hook))
    }

    /// Model-aware variant; receives the model name as first argument.
    pub fn with_model<F>(hook: F) -> Self
    where
        F: Fn(&str, Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        FieldHook::WithModel(Arc::new(hook))
    }

    fn apply(&self, model: &str, value: Value) -> Result<Value, String> {
        match self {
            FieldHook::Value(hook) => hook(value),
            FieldHook::WithModel(hook) => hook(model, value),
        }
    }
}

type InputMap = IndexMap<String, Value>;
type ModelBeforeFn = Arc<dyn Fn(&mut InputMap) -> Result<Option<InputMap>, String> + Send + Sync>;
type ModelBeforeModelFn =
    Arc<dyn Fn(&str, &mut InputMap) -> Result<Option<InputMap>, String> + Send + Sync>;

/// A model-level pre-hook: mutates the input mapping in place and may
/// additionally return a mapping that is merged in (not replacing).
#[derive(Clone)]
pub enum ModelBeforeHook {
    Data(ModelBeforeFn),
    WithModel(ModelBeforeModelFn),
}

impl ModelBeforeHook {
    pub fn data<F>(hook: F) -> Self
    where
        F: Fn(&mut InputMap) -> Result<Option<InputMap>, String> + Send + Sync + 'static,
    {
        ModelBeforeHook::Data(Arc::new(hook))
    }

    pub fn with_model<F>(hook: F) -> Self
    where
        F: Fn(&str, &mut InputMap) -> Result<Option<InputMap>, String> + Send + Sync + 'static,
    {
        ModelBeforeHook::WithModel(Arc::new(hook))
    }

    fn apply(&self, model: &str, data: &mut InputMap) -> Result<Option<InputMap>, String> {
        match self {
            ModelBeforeHook::Data(hook) => hook(data),
            ModelBeforeHook::WithModel(hook) => hook(model, data),
        }
    }
}

type ModelAfterFn = Arc<dyn Fn(&mut ModelInstance) -> Result<(), String> + Send + Sync>;
type ModelAfterModelFn = Arc<dyn Fn(&str, &mut ModelInstance) -> Result<(), String> + Send + Sync>;

/// A model-level post-hook: mutates the constructed instance by side
/// effect; its return carries only success or failure.
#[derive(Clone)]
pub enum ModelAfterHook {
    Instance(ModelAfterFn),
    WithModel(ModelAfterModelFn),
}

impl ModelAfterHook {
    pub fn instance<F>(hook: F) -> Self
    where
        F: Fn(&mut ModelInstance) -> Result<(), String> + Send + Sync + 'static,
    {
        ModelAfterHook::Instance(Arc::new(hook))
    }

    pub fn with_model<F>(hook: F) -> Self
    where
        F: Fn(&str, &mut ModelInstance) -> Result<(), String> + Send + Sync + 'static,
    {
        ModelAfterHook::WithModel(Arc::new(hook))
    }

    fn apply(&self, model: &str, instance: &mut ModelInstance) -> Result<(), String> {
        match self {
            ModelAfterHook::Instance(hook) => hook(instance),
            ModelAfterHook::WithModel(hook) => hook(model, instance),
        }
    }
}

/// The four hook stages of one model, in registration order per stage.
#[derive(Clone, Default)]
pub struct ValidatorSet {
    field_before: IndexMap<String, Vec<FieldHook>>,
    field_after: IndexMap<String, Vec<FieldHook>>,
    model_before: Vec<ModelBeforeHook>,
    model_after: Vec<ModelAfterHook>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        ValidatorSet::default()
    }

    pub fn field_before(mut self, field: impl Into<String>, hook: FieldHook) -> Self {
        self.field_before.entry(field.into()).or_default().push(hook);
        self
    }

    pub fn field_after(mut self, field: impl Into<String>, hook: FieldHook) -> Self {
        self.field_after.entry(field.into()).or_default().push(hook);
        self
    }

    pub fn model_before(mut self, hook: ModelBeforeHook) -> Self {
        self.model_before.push(hook);
        self
    }

    pub fn model_after(mut self, hook: ModelAfterHook) -> Self {
        self.model_after.push(hook);
        self
    }

    pub fn has_field_before(&self) -> bool {
        !self.field_before.is_empty()
    }

    pub fn has_field_after(&self) -> bool {
        !self.field_after.is_empty()
    }

    pub fn has_model_before(&self) -> bool {
        !self.model_before.is_empty()
    }

    pub fn has_model_after(&self) -> bool {
        !self.model_after.is_empty()
    }

    /// Runs model pre-hooks over the input mapping. A returned mapping is
    /// merged into the input, overwriting colliding keys.
    pub(crate) fn apply_model_before(
        &self,
        model: &str,
        data: &mut InputMap,
    ) -> Result<(), String> {
        for hook in &self.model_before {
            if let Some(extra) = hook.apply(model, data)? {
                for (key, value) in extra {
                    data.insert(key, value);
                }
            }
        }
        Ok(())
    }

    /// Chains field pre-hooks over each hooked key present in the input.
    /// Absent keys are skipped; defaults are applied later and do not pass
    /// through pre-hooks.
    pub(crate) fn apply_field_before(
        &self,
        model: &str,
        data: &mut InputMap,
    ) -> Result<(), String> {
        for (field, hooks) in &self.field_before {
            if let Some(slot) = data.get_mut(field) {
                let mut value = std::mem::take(slot);
                for hook in hooks {
                    value = hook.apply(model, value)?;
                }
                *slot = value;
            }
        }
        Ok(())
    }

    /// Chains field post-hooks over each hooked field stored on the
    /// instance, writing the result back.
    pub(crate) fn apply_field_after(
        &self,
        model: &str,
        instance: &mut ModelInstance,
    ) -> Result<(), String> {
        for (field, hooks) in &self.field_after {
            if let Some(mut value) = instance.take_field(field) {
                for hook in hooks {
                    value = hook.apply(model, value)?;
                }
                instance.put_field(field, value);
            }
        }
        Ok(())
    }

    pub(crate) fn apply_model_after(
        &self,
        model: &str,
        instance: &mut ModelInstance,
    ) -> Result<(), String> {
        for hook in &self.model_after {
            hook.apply(model, instance)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ValidatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorSet")
            .field("field_before", &self.field_before.len())
            .field("field_after", &self.field_after.len())
            .field("model_before", &self.model_before.len())
            .field("model_after", &self.model_after.len())
            .finish()
    }
}
