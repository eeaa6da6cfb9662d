//! In-memory fakes shared across the crate's tests.
//!
//! The real history graph, plan executor, and database connection live
//! outside this crate; these stand-ins give the tests deterministic,
//! observable versions of each contract. The executor fake only handles
//! linear per-component histories, which is all the tests need.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use basalt_schema::ModelDef;
use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::backend::{AuxiliarySqlProvider, SchemaBackend, SchemaEditor};
use crate::engine::DriftDetector;
use crate::error::{MigrateResult, MigrationError};
use crate::executor::{ApplyMode, Direction, Plan, PlanExecutor, PlanStep, Target};
use crate::graph::{HistoryGraph, Migration, MigrationId};
use crate::progress::{ProgressAction, ProgressEvent, ProgressSink};

/// History graph over a fixed list of migrations.
pub struct StaticGraph {
    migrations: Vec<Migration>,
}

impl StaticGraph {
    /// Create a graph from loaded migrations.
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }
}

impl HistoryGraph for StaticGraph {
    fn conflicts(&self) -> IndexMap<SmolStr, Vec<SmolStr>> {
        // Group same-component migrations by the predecessor they claim;
        // any predecessor claimed twice marks its dependents as
        // colliding.
        let mut by_predecessor: IndexMap<(SmolStr, SmolStr), Vec<SmolStr>> = IndexMap::new();
        for migration in &self.migrations {
            for dep in &migration.dependencies {
                if dep.component == migration.id.component {
                    by_predecessor
                        .entry((dep.component.clone(), dep.name.clone()))
                        .or_default()
                        .push(migration.id.name.clone());
                }
            }
        }

        let mut conflicts: IndexMap<SmolStr, Vec<SmolStr>> = IndexMap::new();
        for ((component, _), dependents) in by_predecessor {
            if dependents.len() > 1 {
                let entry = conflicts.entry(component).or_default();
                for name in dependents {
                    if !entry.contains(&name) {
                        entry.push(name);
                    }
                }
            }
        }
        conflicts
    }

    fn leaf_migrations(&self, component: Option<&str>) -> Vec<MigrationId> {
        let depended_on: BTreeSet<&MigrationId> = self
            .migrations
            .iter()
            .flat_map(|m| m.dependencies.iter())
            .collect();

        self.migrations
            .iter()
            .map(|m| &m.id)
            .filter(|id| !depended_on.contains(id))
            .filter(|id| component.is_none_or(|c| id.component == c))
            .cloned()
            .collect()
    }

    fn find_by_prefix(&self, component: &str, prefix: &str) -> MigrateResult<MigrationId> {
        let matches: Vec<&MigrationId> = self
            .migrations
            .iter()
            .map(|m| &m.id)
            .filter(|id| id.component == component && id.name.starts_with(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(MigrationError::UnknownMigration {
                component: SmolStr::new(component),
                name: SmolStr::new(prefix),
            }),
            [id] => Ok((*id).clone()),
            _ => Err(MigrationError::AmbiguousMigration {
                component: SmolStr::new(component),
                prefix: SmolStr::new(prefix),
                matches: matches.iter().map(|id| id.name.clone()).collect(),
            }),
        }
    }

    fn migrated_components(&self) -> BTreeSet<SmolStr> {
        self.migrations
            .iter()
            .map(|m| m.id.component.clone())
            .collect()
    }
}

/// Plan executor over linear per-component histories.
///
/// `order` lists every known migration in dependency order; the applied
/// set starts from the builder and is updated as steps run.
pub struct FakeExecutor {
    order: Vec<MigrationId>,
    applied: Mutex<BTreeSet<MigrationId>>,
    fail_at: Option<usize>,
}

impl FakeExecutor {
    /// Create an executor over migrations in dependency order.
    pub fn new(order: Vec<MigrationId>) -> Self {
        Self {
            order,
            applied: Mutex::new(BTreeSet::new()),
            fail_at: None,
        }
    }

    /// Mark a migration as currently applied.
    pub fn applied(self, component: &str, name: &str) -> Self {
        self.applied
            .lock()
            .unwrap()
            .insert(MigrationId::new(component, name));
        self
    }

    /// Fail with a plan-execution error when reaching step `index`.
    pub fn fail_after(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Whether a migration is currently recorded as applied.
    pub fn is_applied(&self, component: &str, name: &str) -> bool {
        self.applied
            .lock()
            .unwrap()
            .contains(&MigrationId::new(component, name))
    }
}

#[async_trait]
impl PlanExecutor for FakeExecutor {
    async fn compute_plan(&self, targets: &[Target]) -> MigrateResult<Plan> {
        let applied = self.applied.lock().unwrap().clone();
        let mut steps = Vec::new();

        for target in targets {
            let chain: Vec<&MigrationId> = self
                .order
                .iter()
                .filter(|id| id.component == target.component)
                .collect();
            let target_idx = match &target.migration {
                Some(name) => chain.iter().position(|id| id.name == *name).map(|i| i as isize),
                None => Some(-1),
            }
            .ok_or_else(|| MigrationError::UnknownMigration {
                component: target.component.clone(),
                name: target.migration.clone().unwrap_or_default(),
            })?;

            for (i, id) in chain.iter().enumerate().rev() {
                if i as isize > target_idx && applied.contains(*id) {
                    steps.push(PlanStep::unapply((*id).clone()));
                }
            }
            for (i, id) in chain.iter().enumerate() {
                if i as isize <= target_idx && !applied.contains(*id) {
                    steps.push(PlanStep::apply((*id).clone()));
                }
            }
        }

        Ok(Plan { steps })
    }

    async fn execute(
        &self,
        plan: &Plan,
        mode: ApplyMode,
        progress: &mut dyn ProgressSink,
    ) -> MigrateResult<()> {
        for (index, step) in plan.steps.iter().enumerate() {
            let (start, success) = match step.direction {
                Direction::Apply => (ProgressAction::ApplyStart, ProgressAction::ApplySuccess),
                Direction::Unapply => {
                    (ProgressAction::UnapplyStart, ProgressAction::UnapplySuccess)
                }
            };

            progress.report(&ProgressEvent::new(
                start,
                step.migration.clone(),
                mode.is_fake(),
            ));

            if self.fail_at == Some(index) {
                return Err(MigrationError::plan_execution(format!(
                    "simulated failure at {}",
                    step.migration
                )));
            }

            {
                let mut applied = self.applied.lock().unwrap();
                match step.direction {
                    Direction::Apply => applied.insert(step.migration.clone()),
                    Direction::Unapply => applied.remove(&step.migration),
                };
            }

            progress.report(&ProgressEvent::new(
                success,
                step.migration.clone(),
                mode.is_fake(),
            ));
        }

        Ok(())
    }
}

#[derive(Default)]
struct BackendState {
    tables: BTreeSet<String>,
    log: Vec<String>,
    snapshot: Option<BTreeSet<String>>,
    prepare_calls: usize,
}

/// In-memory schema backend with an inspectable statement log.
pub struct MemoryBackend {
    supports_rollback: bool,
    defer_constraints: bool,
    fail_creating: Option<String>,
    fail_tx_containing: Option<String>,
    state: Mutex<BackendState>,
}

impl MemoryBackend {
    /// Create a backend, transactional for DDL or not.
    pub fn new(supports_rollback: bool) -> Self {
        Self {
            supports_rollback,
            defer_constraints: false,
            fail_creating: None,
            fail_tx_containing: None,
            state: Mutex::new(BackendState::default()),
        }
    }

    /// Emit one deferred constraint statement per created table.
    pub fn defer_constraints(mut self) -> Self {
        self.defer_constraints = true;
        self
    }

    /// Fail table creation for the named table.
    pub fn fail_creating(mut self, table: &str) -> Self {
        self.fail_creating = Some(table.to_string());
        self
    }

    /// Fail any transactional batch containing the marker.
    pub fn fail_tx_containing(mut self, marker: &str) -> Self {
        self.fail_tx_containing = Some(marker.to_string());
        self
    }

    /// Whether the table currently exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.state.lock().unwrap().tables.contains(name)
    }

    /// Every statement issued so far, in order.
    pub fn statement_log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Number of statements issued so far.
    pub fn statement_count(&self) -> usize {
        self.state.lock().unwrap().log.len()
    }

    /// Number of times `prepare_database` ran.
    pub fn prepare_calls(&self) -> usize {
        self.state.lock().unwrap().prepare_calls
    }
}

#[async_trait]
impl SchemaBackend for MemoryBackend {
    async fn prepare_database(&self) -> MigrateResult<()> {
        self.state.lock().unwrap().prepare_calls += 1;
        Ok(())
    }

    async fn table_names(&self) -> MigrateResult<BTreeSet<String>> {
        Ok(self.state.lock().unwrap().tables.clone())
    }

    fn supports_ddl_rollback(&self) -> bool {
        self.supports_rollback
    }

    async fn begin_ddl(&self) -> MigrateResult<()> {
        let mut state = self.state.lock().unwrap();
        state.snapshot = Some(state.tables.clone());
        Ok(())
    }

    async fn commit_ddl(&self) -> MigrateResult<()> {
        self.state.lock().unwrap().snapshot = None;
        Ok(())
    }

    async fn rollback_ddl(&self) -> MigrateResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(snapshot) = state.snapshot.take() {
            state.tables = snapshot;
        }
        Ok(())
    }

    async fn execute(&self, sql: &str) -> MigrateResult<()> {
        self.state.lock().unwrap().log.push(sql.to_string());
        Ok(())
    }

    async fn execute_in_transaction(&self, statements: &[String]) -> MigrateResult<()> {
        if let Some(marker) = &self.fail_tx_containing {
            if statements.iter().any(|s| s.contains(marker)) {
                return Err(MigrationError::database(format!(
                    "simulated failure executing batch containing '{marker}'"
                )));
            }
        }
        let mut state = self.state.lock().unwrap();
        state.log.extend(statements.iter().cloned());
        Ok(())
    }

    fn editor(&self) -> Box<dyn SchemaEditor + '_> {
        Box::new(MemoryEditor {
            backend: self,
            deferred: Vec::new(),
        })
    }
}

struct MemoryEditor<'a> {
    backend: &'a MemoryBackend,
    deferred: Vec<String>,
}

#[async_trait]
impl SchemaEditor for MemoryEditor<'_> {
    async fn create_table(&mut self, model: &ModelDef) -> MigrateResult<()> {
        if self.backend.fail_creating.as_deref() == Some(model.table.as_str()) {
            return Err(MigrationError::database(format!(
                "simulated failure creating '{}'",
                model.table
            )));
        }

        let mut state = self.backend.state.lock().unwrap();
        state.tables.insert(model.table.to_string());
        state.log.push(format!("CREATE TABLE {}", model.table));

        if self.backend.defer_constraints {
            self.deferred
                .push(format!("ALTER TABLE {} ADD CONSTRAINT fk", model.table));
        }
        Ok(())
    }

    fn take_deferred_sql(&mut self) -> Vec<String> {
        std::mem::take(&mut self.deferred)
    }
}

/// Signal bus that records every notification's payload labels.
#[derive(Default)]
pub struct RecordingBus {
    events: Mutex<Vec<(&'static str, Vec<String>)>>,
}

impl RecordingBus {
    /// Payloads of every pre-change notification, in order.
    pub fn pre_payloads(&self) -> Vec<Vec<String>> {
        self.payloads("pre")
    }

    /// Payloads of every post-change notification, in order.
    pub fn post_payloads(&self) -> Vec<Vec<String>> {
        self.payloads("post")
    }

    fn payloads(&self, kind: &str) -> Vec<Vec<String>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, labels)| labels.clone())
            .collect()
    }

    fn record(&self, kind: &'static str, models: &[ModelDef]) {
        let labels = models.iter().map(ModelDef::label).collect();
        self.events.lock().unwrap().push((kind, labels));
    }
}

impl crate::signal::SignalBus for RecordingBus {
    fn pre_change(&self, candidates: &[ModelDef]) {
        self.record("pre", candidates);
    }

    fn post_change(&self, created: &[ModelDef]) {
        self.record("post", created);
    }
}

/// Auxiliary-SQL provider backed by a label → statements map.
#[derive(Default)]
pub struct StaticAuxSql {
    statements: HashMap<String, Vec<String>>,
}

impl StaticAuxSql {
    /// Register statements for a `component.Model` label.
    pub fn with(mut self, label: &str, statements: &[&str]) -> Self {
        self.statements.insert(
            label.to_string(),
            statements.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

impl AuxiliarySqlProvider for StaticAuxSql {
    fn statements_for(&self, model: &ModelDef) -> Vec<String> {
        self.statements.get(&model.label()).cloned().unwrap_or_default()
    }
}

/// Drift detector with a canned answer.
pub struct DriftStub(pub bool);

impl DriftDetector for DriftStub {
    fn has_undeclared_changes(&self) -> MigrateResult<bool> {
        Ok(self.0)
    }
}

/// Progress sink that keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    /// Events in arrival order.
    pub events: Vec<ProgressEvent>,
}

impl ProgressSink for RecordingSink {
    fn report(&mut self, event: &ProgressEvent) {
        self.events.push(event.clone());
    }
}
