//! Error types for the object model.

use thiserror::Error;

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building the object model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A model with the same name is already registered for the component.
    #[error("model '{name}' is already registered in component '{component}'")]
    DuplicateModel {
        /// Owning component.
        component: String,
        /// Model name.
        name: String,
    },

    /// The component is not present in the registry.
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
}

impl SchemaError {
    /// Create a duplicate model error.
    pub fn duplicate(component: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateModel {
            component: component.into(),
            name: name.into(),
        }
    }
}
