//! Connection-side contracts: introspection, DDL execution, and the
//! capability-scoped transaction boundary.

use std::collections::BTreeSet;

use async_trait::async_trait;
use basalt_schema::ModelDef;

use crate::error::MigrateResult;

/// Live-connection surface consumed by the synchronizer.
///
/// One invocation owns the connection exclusively for its duration;
/// nothing here is designed for concurrent callers.
#[async_trait]
pub trait SchemaBackend: Send + Sync {
    /// Backend hook run once before any synchronization work.
    async fn prepare_database(&self) -> MigrateResult<()> {
        Ok(())
    }

    /// Names of the tables that currently exist.
    async fn table_names(&self) -> MigrateResult<BTreeSet<String>>;

    /// Whether DDL statements can be rolled back on this backend.
    ///
    /// This is a property of the backend, never a per-call choice.
    fn supports_ddl_rollback(&self) -> bool;

    /// Normalize a declared table name to the form introspection reports.
    fn normalize_table_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Open a transaction for a DDL batch.
    async fn begin_ddl(&self) -> MigrateResult<()>;

    /// Commit the DDL batch transaction.
    async fn commit_ddl(&self) -> MigrateResult<()>;

    /// Roll back the DDL batch transaction.
    async fn rollback_ddl(&self) -> MigrateResult<()>;

    /// Execute one statement on the current cursor.
    async fn execute(&self, sql: &str) -> MigrateResult<()>;

    /// Execute `statements` inside one independent transaction: all of
    /// them commit or none do.
    async fn execute_in_transaction(&self, statements: &[String]) -> MigrateResult<()>;

    /// Acquire a schema editor for one table-creation batch.
    fn editor(&self) -> Box<dyn SchemaEditor + '_>;

    /// Re-acquire a cursor context. Closing a DDL boundary may invalidate
    /// the previous one.
    async fn reset_cursor(&self) -> MigrateResult<()> {
        Ok(())
    }
}

/// Emits table-creation DDL for one model at a time.
///
/// Statements that reference tables not yet created (constraints across
/// the batch) are buffered instead of executed; the caller drains them
/// with [`take_deferred_sql`] once every table of the batch exists. An
/// editor's lifetime brackets exactly one table-creation loop.
///
/// [`take_deferred_sql`]: SchemaEditor::take_deferred_sql
#[async_trait]
pub trait SchemaEditor: Send {
    /// Create the table for `model`, buffering any statements that must
    /// wait for the rest of the batch.
    async fn create_table(&mut self, model: &ModelDef) -> MigrateResult<()>;

    /// Take the statements buffered so far, clearing the buffer.
    fn take_deferred_sql(&mut self) -> Vec<String>;
}

/// Source of per-model auxiliary SQL (triggers, grants, seed statements).
pub trait AuxiliarySqlProvider: Send + Sync {
    /// Ordered statements to run once `model`'s table exists. Empty when
    /// the model has none.
    fn statements_for(&self, model: &ModelDef) -> Vec<String>;
}

/// Provider with no auxiliary SQL for any model.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuxiliarySql;

impl AuxiliarySqlProvider for NoAuxiliarySql {
    fn statements_for(&self, _model: &ModelDef) -> Vec<String> {
        Vec::new()
    }
}

/// Scoped transaction boundary for one DDL batch.
///
/// Opening starts a real transaction when the backend can roll DDL back
/// and a no-op scope otherwise; the capability decides, not the caller.
/// The boundary must be closed through [`commit`] or [`abort`] on every
/// exit path; both consume it.
///
/// [`commit`]: DdlBoundary::commit
/// [`abort`]: DdlBoundary::abort
pub struct DdlBoundary<'a> {
    backend: &'a dyn SchemaBackend,
    transactional: bool,
}

impl<'a> DdlBoundary<'a> {
    /// Open the boundary.
    pub async fn open(backend: &'a dyn SchemaBackend) -> MigrateResult<Self> {
        let transactional = backend.supports_ddl_rollback();
        if transactional {
            backend.begin_ddl().await?;
        }
        Ok(Self {
            backend,
            transactional,
        })
    }

    /// Whether the boundary is backed by a real transaction.
    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Commit everything done inside the boundary.
    pub async fn commit(self) -> MigrateResult<()> {
        if self.transactional {
            self.backend.commit_ddl().await
        } else {
            Ok(())
        }
    }

    /// Roll back everything done inside the boundary, where the backend
    /// allows it. A no-op scope has nothing to undo.
    pub async fn abort(self) -> MigrateResult<()> {
        if self.transactional {
            self.backend.rollback_ddl().await
        } else {
            Ok(())
        }
    }
}
