//! Migration identity types and the history-graph contract.
//!
//! The history graph itself (dependency edges, conflict detection,
//! applied-state bookkeeping) is built by an external loader before the
//! orchestrator runs. This module defines the identity types and the
//! read-only surface the orchestrator consumes.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::MigrateResult;

/// Identity of one migration: owning component plus unique name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MigrationId {
    /// Owning component.
    pub component: SmolStr,
    /// Migration name, unique within the component.
    pub name: SmolStr,
}

impl MigrationId {
    /// Create a new migration identity.
    pub fn new(component: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            component: component.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.name)
    }
}

/// One named step of schema evolution within a component.
///
/// Immutable once loaded; owned by the history graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Identity of the migration.
    pub id: MigrationId,
    /// Migrations that must be applied before this one, in order.
    pub dependencies: Vec<MigrationId>,
}

impl Migration {
    /// Create a migration with no dependencies.
    pub fn new(component: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            id: MigrationId::new(component, name),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency.
    pub fn depends_on(mut self, component: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        self.dependencies.push(MigrationId::new(component, name));
        self
    }
}

/// Read surface of the migration history graph.
///
/// Implementations are expected to be fully loaded in memory; none of
/// these calls touch the database.
pub trait HistoryGraph: Send + Sync {
    /// Components whose migrations collide (two or more migrations in the
    /// same component claiming the same predecessor), mapped to the
    /// colliding names. Empty when the graph is consistent.
    fn conflicts(&self) -> IndexMap<SmolStr, Vec<SmolStr>>;

    /// Leaf migrations (those nothing else depends on), optionally
    /// restricted to one component.
    fn leaf_migrations(&self, component: Option<&str>) -> Vec<MigrationId>;

    /// Resolve a name prefix to the single migration it identifies within
    /// a component.
    ///
    /// Fails with [`AmbiguousMigration`] when several names share the
    /// prefix and [`UnknownMigration`] when none do.
    ///
    /// [`AmbiguousMigration`]: crate::error::MigrationError::AmbiguousMigration
    /// [`UnknownMigration`]: crate::error::MigrationError::UnknownMigration
    fn find_by_prefix(&self, component: &str, prefix: &str) -> MigrateResult<MigrationId>;

    /// Names of components that own at least one migration.
    fn migrated_components(&self) -> BTreeSet<SmolStr>;
}
