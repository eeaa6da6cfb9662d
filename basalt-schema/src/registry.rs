//! Insertion-order-preserving registry of components and their models.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::{SchemaError, SchemaResult};
use crate::model::ModelDef;

/// Registry of all declared models, grouped by owning component.
///
/// Components and models iterate in registration order. Ordering affects
/// signal payloads and log output, not correctness.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    components: IndexMap<SmolStr, Vec<ModelDef>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its owning component.
    ///
    /// The component entry is created on first registration. Registering
    /// two models with the same name in one component is rejected.
    pub fn register(&mut self, model: ModelDef) -> SchemaResult<()> {
        let models = self.components.entry(model.component.clone()).or_default();
        if models.iter().any(|m| m.name == model.name) {
            return Err(SchemaError::duplicate(
                model.component.as_str(),
                model.name.as_str(),
            ));
        }
        models.push(model);
        Ok(())
    }

    /// Declare a component with no models yet.
    pub fn register_component(&mut self, component: impl Into<SmolStr>) {
        self.components.entry(component.into()).or_default();
    }

    /// Component names in registration order.
    pub fn components(&self) -> impl Iterator<Item = &SmolStr> {
        self.components.keys()
    }

    /// Models owned by `component`, in registration order. Empty for
    /// unknown components.
    pub fn models(&self, component: &str) -> &[ModelDef] {
        self.components
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `component` has been registered.
    pub fn contains_component(&self, component: &str) -> bool {
        self.components.contains_key(component)
    }

    /// Iterate components and their models in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &[ModelDef])> {
        self.components.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Total number of registered models across all components.
    pub fn len(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }

    /// Whether the registry holds no models at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
