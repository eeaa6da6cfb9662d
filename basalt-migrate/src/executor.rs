//! Plan types and the plan-executor contract.
//!
//! The executor is the collaborator that knows how to turn targets into
//! an ordered plan and how to run that plan against the connection,
//! honoring dependency order and persisting applied state. The
//! orchestrator only decides which targets to hand it and in which mode.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::MigrateResult;
use crate::graph::MigrationId;
use crate::progress::ProgressSink;

/// Desired end state for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Component name.
    pub component: SmolStr,
    /// Migration to end at; `None` unapplies everything in the component.
    pub migration: Option<SmolStr>,
}

impl Target {
    /// Target the state after a specific migration.
    pub fn at(component: impl Into<SmolStr>, migration: impl Into<SmolStr>) -> Self {
        Self {
            component: component.into(),
            migration: Some(migration.into()),
        }
    }

    /// Target the state with no migrations applied.
    pub fn zero(component: impl Into<SmolStr>) -> Self {
        Self {
            component: component.into(),
            migration: None,
        }
    }
}

impl From<MigrationId> for Target {
    fn from(id: MigrationId) -> Self {
        Self {
            component: id.component,
            migration: Some(id.name),
        }
    }
}

/// Direction of one plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Apply the migration (forward).
    Apply,
    /// Unapply the migration (backward).
    Unapply,
}

/// One ordered operation of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// The migration to operate on.
    pub migration: MigrationId,
    /// Forward or backward.
    pub direction: Direction,
}

impl PlanStep {
    /// Create an apply step.
    pub fn apply(migration: MigrationId) -> Self {
        Self {
            migration,
            direction: Direction::Apply,
        }
    }

    /// Create an unapply step.
    pub fn unapply(migration: MigrationId) -> Self {
        Self {
            migration,
            direction: Direction::Unapply,
        }
    }
}

/// Ordered operations realizing a set of targets.
///
/// Respects migration dependency order: a migration is unapplied only
/// when no remaining-applied migration depends on it. Computed fresh per
/// invocation and never persisted here; applied-state persistence is the
/// executor's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// The steps, in execution order.
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Number of forward steps.
    pub fn apply_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.direction == Direction::Apply)
            .count()
    }

    /// Number of backward steps.
    pub fn unapply_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.direction == Direction::Unapply)
            .count()
    }
}

/// How plan steps are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Execute the DDL and record state.
    #[default]
    Execute,
    /// Record migrations as applied or unapplied without running their
    /// DDL.
    Fake,
}

impl ApplyMode {
    /// Whether steps are recorded without running DDL.
    pub fn is_fake(self) -> bool {
        self == Self::Fake
    }
}

/// Computes and applies plans against the live connection.
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    /// Compute the ordered operations needed to reach `targets` from the
    /// currently applied state.
    async fn compute_plan(&self, targets: &[Target]) -> MigrateResult<Plan>;

    /// Run `plan` one step at a time, reporting to `progress` around each
    /// step.
    ///
    /// May fail mid-plan; steps already carried out are not rolled back
    /// by the caller.
    async fn execute(
        &self,
        plan: &Plan,
        mode: ApplyMode,
        progress: &mut dyn ProgressSink,
    ) -> MigrateResult<()>;
}
