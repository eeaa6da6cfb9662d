//! Target resolution: from a caller's request to concrete
//! (component, migration) targets.

use smol_str::SmolStr;

use crate::error::{MigrateResult, MigrationError};
use crate::executor::Target;
use crate::graph::HistoryGraph;

/// Sentinel migration name meaning "unapply everything in the component".
pub const ZERO: &str = "zero";

/// What the caller asked to synchronize.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetRequest {
    /// Advance every component to its latest migration.
    #[default]
    Latest,
    /// Advance one component to its latest migration.
    Component(SmolStr),
    /// Bring one component to the state after the named migration. The
    /// name may be a unique prefix; [`ZERO`] unapplies the whole
    /// component.
    Migration {
        /// Component to target.
        component: SmolStr,
        /// Migration name, unique prefix, or the zero sentinel.
        name: SmolStr,
    },
}

impl TargetRequest {
    /// Request one component at its latest migration.
    pub fn component(name: impl Into<SmolStr>) -> Self {
        Self::Component(name.into())
    }

    /// Request one component at a specific migration.
    pub fn migration(component: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self::Migration {
            component: component.into(),
            name: name.into(),
        }
    }
}

/// Concrete targets plus whether components without migration history
/// should also be synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargets {
    /// One target per component end state.
    pub targets: Vec<Target>,
    /// True only for the whole-project request: components with no
    /// history get direct table synchronization.
    pub sync_unmanaged: bool,
}

/// Resolve `request` against the history graph.
///
/// Conflict detection runs first and unconditionally: a graph with
/// colliding migrations aborts every request, however narrow.
pub fn resolve_targets(
    graph: &dyn HistoryGraph,
    request: &TargetRequest,
) -> MigrateResult<ResolvedTargets> {
    let conflicts = graph.conflicts();
    if !conflicts.is_empty() {
        return Err(MigrationError::ConflictingHistory { conflicts });
    }

    match request {
        TargetRequest::Latest => Ok(ResolvedTargets {
            targets: graph
                .leaf_migrations(None)
                .into_iter()
                .map(Target::from)
                .collect(),
            sync_unmanaged: true,
        }),
        TargetRequest::Component(component) => {
            ensure_migrated(graph, component)?;
            Ok(ResolvedTargets {
                targets: graph
                    .leaf_migrations(Some(component))
                    .into_iter()
                    .map(Target::from)
                    .collect(),
                sync_unmanaged: false,
            })
        }
        TargetRequest::Migration { component, name } => {
            ensure_migrated(graph, component)?;
            let target = if name == ZERO {
                Target::zero(component.clone())
            } else {
                Target::from(graph.find_by_prefix(component, name)?)
            };
            Ok(ResolvedTargets {
                targets: vec![target],
                sync_unmanaged: false,
            })
        }
    }
}

fn ensure_migrated(graph: &dyn HistoryGraph, component: &SmolStr) -> MigrateResult<()> {
    if graph.migrated_components().contains(component) {
        Ok(())
    } else {
        Err(MigrationError::UnknownComponent(component.clone()))
    }
}
