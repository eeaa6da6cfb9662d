//! # basalt-schema
//!
//! Declared object model for the Basalt schema toolkit.
//!
//! This crate provides:
//! - [`ModelDef`]: the definition of one schema object (owning component,
//!   model name, table name, management flags)
//! - [`ModelRegistry`]: an insertion-order-preserving registry of
//!   components and the models they own
//!
//! The registry is the "declared target state" that `basalt-migrate`
//! synchronizes a live database against. It carries no SQL and no
//! connection state; it only describes what should exist.
//!
//! ## Example
//!
//! ```rust
//! use basalt_schema::{ModelDef, ModelRegistry};
//!
//! let mut registry = ModelRegistry::new();
//! registry.register(ModelDef::new("blog", "Author")).unwrap();
//! registry.register(ModelDef::new("blog", "Entry").table("blog_entries")).unwrap();
//!
//! assert!(registry.contains_component("blog"));
//! assert_eq!(registry.models("blog").len(), 2);
//! ```

pub mod error;
pub mod model;
pub mod registry;

pub use error::{SchemaError, SchemaResult};
pub use model::ModelDef;
pub use registry::ModelRegistry;
