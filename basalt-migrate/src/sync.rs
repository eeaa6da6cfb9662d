//! Direct table synchronization for components without migration history.
//!
//! Components that never adopted migrations are brought to their declared
//! state by creating the missing tables straight from the object model:
//!
//! 1. Build a manifest of managed, non-proxy models whose tables do not
//!    exist yet, per component, in registry order.
//! 2. Emit the pre-change signal with the flattened manifest, before any
//!    table exists.
//! 3. Create every table inside one capability-scoped DDL boundary,
//!    collecting the statements each creation defers.
//! 4. Run the deferred statements, in enqueue order, once every table of
//!    the batch exists.
//! 5. Install per-model auxiliary SQL on a fresh cursor, each model in
//!    its own transaction; failures there are tolerated and reported as
//!    warnings.
//!
//! Table creation and deferred SQL are all-or-nothing within the boundary
//! when the backend can roll DDL back. Auxiliary SQL is best-effort;
//! schema creation is not.

use std::collections::BTreeSet;

use basalt_schema::{ModelDef, ModelRegistry};
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::backend::{AuxiliarySqlProvider, DdlBoundary, SchemaBackend};
use crate::error::{MigrateResult, MigrationError};
use crate::signal::SignalBus;

/// Per-component list of models whose tables are missing, in registry
/// order. A requested component with nothing to create keeps an empty
/// entry.
pub type Manifest = IndexMap<SmolStr, Vec<ModelDef>>;

/// Build the manifest for `components`.
///
/// A model is included iff it is managed, not a proxy, its table is
/// absent from `existing`, and its implicit base table (if any) is absent
/// as well.
pub fn build_manifest(
    registry: &ModelRegistry,
    backend: &dyn SchemaBackend,
    existing: &BTreeSet<String>,
    components: &BTreeSet<SmolStr>,
) -> Manifest {
    let mut manifest = Manifest::new();
    for (component, models) in registry.iter() {
        if !components.contains(component) {
            continue;
        }
        let missing = models
            .iter()
            .filter(|model| table_missing(model, backend, existing))
            .cloned()
            .collect();
        manifest.insert(component.clone(), missing);
    }
    manifest
}

fn table_missing(model: &ModelDef, backend: &dyn SchemaBackend, existing: &BTreeSet<String>) -> bool {
    if !model.managed || model.proxy {
        return false;
    }
    if existing.contains(&backend.normalize_table_name(&model.table)) {
        return false;
    }
    if let Some(base) = &model.base_table {
        if existing.contains(&backend.normalize_table_name(base)) {
            return false;
        }
    }
    true
}

/// Result of one legacy synchronization run.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Models whose tables were created, in manifest order.
    pub created: Vec<ModelDef>,
    /// Non-fatal problems encountered while installing auxiliary SQL.
    pub warnings: Vec<String>,
}

impl SyncOutcome {
    /// Whether the run created nothing and warned about nothing.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.warnings.is_empty()
    }
}

/// Creates missing tables for components that have no migration history.
pub struct LegacySynchronizer<'a> {
    registry: &'a ModelRegistry,
    backend: &'a dyn SchemaBackend,
    signals: &'a dyn SignalBus,
    aux_sql: &'a dyn AuxiliarySqlProvider,
}

impl<'a> LegacySynchronizer<'a> {
    /// Create a synchronizer over the given collaborators.
    pub fn new(
        registry: &'a ModelRegistry,
        backend: &'a dyn SchemaBackend,
        signals: &'a dyn SignalBus,
        aux_sql: &'a dyn AuxiliarySqlProvider,
    ) -> Self {
        Self {
            registry,
            backend,
            signals,
            aux_sql,
        }
    }

    /// Synchronize `components`, returning the models actually created.
    ///
    /// Emits the pre-change signal exactly once, before any DDL. Running
    /// twice against the same schema is a no-op the second time: the
    /// manifest filters out tables that already exist.
    pub async fn sync(&self, components: &BTreeSet<SmolStr>) -> MigrateResult<SyncOutcome> {
        let existing = self.backend.table_names().await?;
        let manifest = build_manifest(self.registry, self.backend, &existing, components);

        let candidates: Vec<ModelDef> = manifest.values().flatten().cloned().collect();
        self.signals.pre_change(&candidates);

        let mut outcome = SyncOutcome::default();
        if candidates.is_empty() {
            debug!("no missing tables, nothing to synchronize");
            return Ok(outcome);
        }

        info!(tables = candidates.len(), "creating tables");
        let boundary = DdlBoundary::open(self.backend).await?;
        match self.create_tables(&manifest).await {
            Ok(created) => {
                boundary.commit().await?;
                outcome.created = created;
            }
            Err(err) => {
                let rolled_back = boundary.is_transactional();
                if let Err(abort_err) = boundary.abort().await {
                    warn!(error = %abort_err, "failed to roll back DDL boundary");
                }
                return Err(if rolled_back {
                    err
                } else {
                    annotate_partial_state(err)
                });
            }
        }

        self.install_auxiliary_sql(&outcome.created, &mut outcome.warnings)
            .await?;

        Ok(outcome)
    }

    /// Create every table in the manifest, then run the deferred SQL.
    async fn create_tables(&self, manifest: &Manifest) -> MigrateResult<Vec<ModelDef>> {
        let mut created = Vec::new();
        let mut deferred_sql = Vec::new();

        {
            let mut editor = self.backend.editor();
            for (component, models) in manifest {
                for model in models {
                    debug!(component = %component, table = %model.table, "creating table");
                    editor.create_table(model).await.map_err(|err| {
                        MigrationError::schema_creation(format!(
                            "creating table '{}' for {}: {}",
                            model.table,
                            model.label(),
                            err
                        ))
                    })?;
                    deferred_sql.extend(editor.take_deferred_sql());
                    created.push(model.clone());
                }
            }
        }

        // Every table of the batch exists now; forward references are
        // safe to install.
        if !deferred_sql.is_empty() {
            debug!(statements = deferred_sql.len(), "running deferred SQL");
        }
        for statement in &deferred_sql {
            self.backend.execute(statement).await.map_err(|err| {
                MigrationError::schema_creation(format!("running deferred SQL: {err}"))
            })?;
        }

        Ok(created)
    }

    /// Install auxiliary SQL for each created model, tolerating per-model
    /// failures.
    async fn install_auxiliary_sql(
        &self,
        created: &[ModelDef],
        warnings: &mut Vec<String>,
    ) -> MigrateResult<()> {
        // Closing the DDL boundary may have invalidated the cursor.
        self.backend.reset_cursor().await?;

        for model in created {
            let statements = self.aux_sql.statements_for(model);
            if statements.is_empty() {
                continue;
            }
            debug!(model = %model.label(), statements = statements.len(), "installing auxiliary SQL");
            if let Err(err) = self.backend.execute_in_transaction(&statements).await {
                warn!(model = %model.label(), error = %err, "failed to install auxiliary SQL");
                warnings.push(format!(
                    "failed to install auxiliary SQL for {}: {}",
                    model.label(),
                    err
                ));
            }
        }

        Ok(())
    }
}

fn annotate_partial_state(err: MigrationError) -> MigrationError {
    match err {
        MigrationError::SchemaCreation(msg) => MigrationError::SchemaCreation(format!(
            "{msg}; this backend cannot roll back DDL, tables created earlier in the batch were left in place"
        )),
        other => other,
    }
}
