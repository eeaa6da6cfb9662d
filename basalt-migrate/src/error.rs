//! Error types for the synchronization orchestrator.

use indexmap::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;

/// Result type alias for synchronization operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while resolving targets or applying schema
/// changes.
///
/// Every variant here is fatal to the invocation. Auxiliary-SQL
/// installation failures are deliberately not represented: they are
/// tolerated, logged, and surfaced as report warnings instead.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Two or more migrations in one component claim the same predecessor.
    #[error(
        "conflicting migrations detected ({}). Merge the conflicting migrations and retry",
        format_conflicts(.conflicts)
    )]
    ConflictingHistory {
        /// Component name mapped to the names of its colliding migrations.
        conflicts: IndexMap<SmolStr, Vec<SmolStr>>,
    },

    /// The component has no migration history and cannot be targeted
    /// selectively.
    #[error(
        "component '{0}' does not have migrations (you cannot selectively sync unmigrated components)"
    )]
    UnknownComponent(SmolStr),

    /// No migration in the component matches the requested name or prefix.
    #[error("cannot find a migration matching '{name}' in component '{component}'")]
    UnknownMigration {
        /// Requested component.
        component: SmolStr,
        /// Requested name or prefix.
        name: SmolStr,
    },

    /// More than one migration in the component matches the requested
    /// prefix.
    #[error(
        "more than one migration matches '{prefix}' in component '{component}' ({}). Please be more specific",
        format_names(.matches)
    )]
    AmbiguousMigration {
        /// Requested component.
        component: SmolStr,
        /// Requested prefix.
        prefix: SmolStr,
        /// Every migration name the prefix matched.
        matches: Vec<SmolStr>,
    },

    /// Table creation or deferred DDL failed during legacy
    /// synchronization.
    #[error("schema creation failed: {0}")]
    SchemaCreation(String),

    /// The plan executor reported an unrecoverable failure mid-plan.
    #[error("plan execution failed: {0}")]
    PlanExecution(String),

    /// Database operation error.
    #[error("database error: {0}")]
    Database(String),
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a schema creation error.
    pub fn schema_creation(msg: impl Into<String>) -> Self {
        Self::SchemaCreation(msg.into())
    }

    /// Create a plan execution error.
    pub fn plan_execution(msg: impl Into<String>) -> Self {
        Self::PlanExecution(msg.into())
    }

    /// Whether the error aborts the invocation before any DDL is issued.
    pub fn is_pre_ddl(&self) -> bool {
        matches!(
            self,
            Self::ConflictingHistory { .. }
                | Self::UnknownComponent(_)
                | Self::UnknownMigration { .. }
                | Self::AmbiguousMigration { .. }
        )
    }
}

fn format_conflicts(conflicts: &IndexMap<SmolStr, Vec<SmolStr>>) -> String {
    conflicts
        .iter()
        .map(|(component, names)| format!("{} in {}", format_names(names), component))
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_names(names: &[SmolStr]) -> String {
    names
        .iter()
        .map(SmolStr::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
