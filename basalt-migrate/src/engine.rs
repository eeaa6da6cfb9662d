//! The synchronization engine.
//!
//! One invocation runs end to end: resolve the target request against
//! the history graph, compute a plan through the executor, bring
//! history-less components up to date by direct table creation, execute
//! the plan, and report. Lifecycle signals bracket the whole invocation:
//! exactly one pre-change notification before any DDL and one
//! post-change notification after everything, on every success path.

use std::collections::BTreeSet;

use basalt_schema::ModelRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use smol_str::SmolStr;
use tracing::{debug, info};

use crate::backend::{AuxiliarySqlProvider, NoAuxiliarySql, SchemaBackend};
use crate::error::MigrateResult;
use crate::executor::{ApplyMode, PlanExecutor, Target};
use crate::graph::HistoryGraph;
use crate::progress::ProgressSink;
use crate::resolver::{TargetRequest, resolve_targets};
use crate::signal::{NullBus, SignalBus};
use crate::sync::{LegacySynchronizer, SyncOutcome};

/// Read-only detector for model changes not yet captured by any
/// migration.
///
/// Consulted only to annotate the "nothing to do" report; findings are
/// never applied.
pub trait DriftDetector: Send + Sync {
    /// Whether the declared model differs from what the migration
    /// history reconstructs.
    fn has_undeclared_changes(&self) -> MigrateResult<bool>;
}

/// Detector that never reports drift.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDrift;

impl DriftDetector for NoDrift {
    fn has_undeclared_changes(&self) -> MigrateResult<bool> {
        Ok(false)
    }
}

static NULL_BUS: NullBus = NullBus;
static NO_AUX_SQL: NoAuxiliarySql = NoAuxiliarySql;
static NO_DRIFT: NoDrift = NoDrift;

/// Outcome of one engine invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// The concrete targets the request resolved to.
    pub targets: Vec<Target>,
    /// Number of forward plan steps carried out.
    pub applied: usize,
    /// Number of backward plan steps carried out.
    pub unapplied: usize,
    /// Tables created by direct synchronization, in creation order.
    pub created_tables: Vec<String>,
    /// Non-fatal problems, currently only auxiliary-SQL failures.
    pub warnings: Vec<String>,
    /// True when neither the plan nor direct synchronization had
    /// anything to do.
    pub no_changes: bool,
    /// True when the model has changes no migration captures yet.
    pub undeclared_changes: bool,
    /// When the invocation started.
    pub started_at: DateTime<Utc>,
    /// When the invocation finished.
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// Total wall-clock duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Get a one-line summary of the invocation.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.created_tables.is_empty() {
            parts.push(format!("{} tables created", self.created_tables.len()));
        }
        if self.applied > 0 {
            parts.push(format!("{} applied", self.applied));
        }
        if self.unapplied > 0 {
            parts.push(format!("{} unapplied", self.unapplied));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("{} warnings", self.warnings.len()));
        }

        if parts.is_empty() {
            if self.undeclared_changes {
                "no changes applied; the model has changes not reflected in any migration"
                    .to_string()
            } else {
                "no changes".to_string()
            }
        } else {
            parts.join(", ")
        }
    }
}

/// Orchestrates one synchronization invocation end to end.
///
/// The engine owns no state of its own; everything it needs arrives as
/// a collaborator. The signal bus, auxiliary-SQL provider, and drift
/// detector default to no-op implementations.
pub struct SyncEngine<'a> {
    registry: &'a ModelRegistry,
    graph: &'a dyn HistoryGraph,
    executor: &'a dyn PlanExecutor,
    backend: &'a dyn SchemaBackend,
    signals: &'a dyn SignalBus,
    aux_sql: &'a dyn AuxiliarySqlProvider,
    drift: &'a dyn DriftDetector,
}

impl<'a> SyncEngine<'a> {
    /// Create an engine over the required collaborators.
    pub fn new(
        registry: &'a ModelRegistry,
        graph: &'a dyn HistoryGraph,
        executor: &'a dyn PlanExecutor,
        backend: &'a dyn SchemaBackend,
    ) -> Self {
        Self {
            registry,
            graph,
            executor,
            backend,
            signals: &NULL_BUS,
            aux_sql: &NO_AUX_SQL,
            drift: &NO_DRIFT,
        }
    }

    /// Set the lifecycle signal bus.
    pub fn with_signal_bus(mut self, signals: &'a dyn SignalBus) -> Self {
        self.signals = signals;
        self
    }

    /// Set the auxiliary-SQL provider.
    pub fn with_auxiliary_sql(mut self, aux_sql: &'a dyn AuxiliarySqlProvider) -> Self {
        self.aux_sql = aux_sql;
        self
    }

    /// Set the drift detector consulted when the plan is empty.
    pub fn with_drift_detector(mut self, drift: &'a dyn DriftDetector) -> Self {
        self.drift = drift;
        self
    }

    /// Run one synchronization invocation.
    ///
    /// Fatal errors abort the remaining work immediately and propagate;
    /// already-applied plan steps are not rolled back here.
    pub async fn run(
        &self,
        request: &TargetRequest,
        mode: ApplyMode,
        progress: &mut dyn ProgressSink,
    ) -> MigrateResult<SyncReport> {
        let started_at = Utc::now();

        self.backend.prepare_database().await?;

        let resolved = resolve_targets(self.graph, request)?;
        let plan = self.executor.compute_plan(&resolved.targets).await?;
        debug!(targets = resolved.targets.len(), steps = plan.len(), "plan computed");

        // Components in the registry but absent from the history graph
        // can only be synchronized by direct table creation, and only
        // the whole-project request covers them. The synchronizer emits
        // the pre-change signal itself; every other path emits it here
        // with an empty payload.
        let outcome = if resolved.sync_unmanaged {
            let unmanaged = self.unmanaged_components();
            if unmanaged.is_empty() {
                self.signals.pre_change(&[]);
                SyncOutcome::default()
            } else {
                info!(
                    components = unmanaged.len(),
                    "synchronizing components without migration history"
                );
                LegacySynchronizer::new(self.registry, self.backend, self.signals, self.aux_sql)
                    .sync(&unmanaged)
                    .await?
            }
        } else {
            self.signals.pre_change(&[]);
            SyncOutcome::default()
        };

        let mut undeclared_changes = false;
        if plan.is_empty() {
            info!("no migrations to apply");
            undeclared_changes = self.drift.has_undeclared_changes()?;
            if undeclared_changes {
                info!(
                    "the model has changes that are not yet reflected in a migration; \
                     they will not be applied"
                );
            }
        } else {
            self.executor.execute(&plan, mode, progress).await?;
        }

        self.signals.post_change(&outcome.created);

        let no_changes = plan.is_empty() && outcome.created.is_empty();
        Ok(SyncReport {
            targets: resolved.targets,
            applied: plan.apply_count(),
            unapplied: plan.unapply_count(),
            created_tables: outcome
                .created
                .iter()
                .map(|m| m.table.to_string())
                .collect(),
            warnings: outcome.warnings,
            no_changes,
            undeclared_changes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Registry components with no migration history.
    fn unmanaged_components(&self) -> BTreeSet<SmolStr> {
        let migrated = self.graph.migrated_components();
        self.registry
            .components()
            .filter(|component| !migrated.contains(*component))
            .cloned()
            .collect()
    }
}
