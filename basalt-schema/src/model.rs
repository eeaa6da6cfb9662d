//! Model definitions for the declared object model.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The definition of one schema object (maps to a database table).
///
/// A model is *managed* when its table is created and evolved by the
/// toolkit, and a *proxy* when it only re-exposes another model's table.
/// Auto-created join models record the table of the model that spawned
/// them in `base_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Component that owns the model.
    pub component: SmolStr,
    /// Model name, unique within the component.
    pub name: SmolStr,
    /// Database table name.
    pub table: SmolStr,
    /// Whether the table is created and evolved by the toolkit.
    pub managed: bool,
    /// Whether this model shares another model's table.
    pub proxy: bool,
    /// Table of the implicit base model, for auto-created models.
    pub base_table: Option<SmolStr>,
}

impl ModelDef {
    /// Create a new managed, non-proxy model. The table name defaults to
    /// `<component>_<name>` with the name lowercased.
    pub fn new(component: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        let component = component.into();
        let name = name.into();
        let table = SmolStr::new(format!("{}_{}", component, name.to_lowercase()));
        Self {
            component,
            name,
            table,
            managed: true,
            proxy: false,
            base_table: None,
        }
    }

    /// Override the database table name.
    pub fn table(mut self, table: impl Into<SmolStr>) -> Self {
        self.table = table.into();
        self
    }

    /// Mark the model as unmanaged; its table is never touched.
    pub fn unmanaged(mut self) -> Self {
        self.managed = false;
        self
    }

    /// Mark the model as a proxy for another model's table.
    pub fn proxy(mut self) -> Self {
        self.proxy = true;
        self
    }

    /// Record the implicit base model's table.
    pub fn base_table(mut self, table: impl Into<SmolStr>) -> Self {
        self.base_table = Some(table.into());
        self
    }

    /// Qualified `component.Model` label used in diagnostics.
    pub fn label(&self) -> String {
        format!("{}.{}", self.component, self.name)
    }
}
