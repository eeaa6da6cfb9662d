//! # basalt-migrate
//!
//! Schema-synchronization orchestrator for the Basalt schema toolkit.
//!
//! This crate provides functionality for:
//! - Resolving a target request ("everything to latest", one component,
//!   or one specific migration, by unique prefix or the `zero` sentinel)
//!   into concrete per-component targets
//! - Detecting conflicting migration histories before anything runs
//! - Direct, idempotent table creation for components that have no
//!   migration history, with deferred-DDL ordering and isolated
//!   installation of auxiliary SQL
//! - Driving plan execution with per-step progress events and a real or
//!   record-only (fake) apply mode
//! - Lifecycle signals bracketing every invocation
//!
//! ## Architecture
//!
//! The orchestrator decides *which* changes to apply, in what order,
//! inside which transactional boundaries. Computing diffs, generating
//! DDL text, and persisting applied state belong to its collaborators,
//! consumed as traits:
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌───────────────┐
//! │ TargetRequest│────▶│ Plan Resolver  │────▶│ PlanExecutor  │
//! └──────────────┘     └────────────────┘     └───────────────┘
//!                              │                      │
//!                       HistoryGraph           progress events
//!                              │                      │
//!                      ┌────────────────┐     ┌───────────────┐
//!                      │ LegacySync     │────▶│ SchemaBackend │
//!                      │ (no-history    │     │ + SchemaEditor│
//!                      │  components)   │     └───────────────┘
//!                      └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use basalt_migrate::{ApplyMode, SyncEngine, TargetRequest, TracingSink};
//!
//! async fn migrate_everything() -> basalt_migrate::MigrateResult<()> {
//!     let engine = SyncEngine::new(&registry, &graph, &executor, &backend)
//!         .with_signal_bus(&signals);
//!
//!     let report = engine
//!         .run(&TargetRequest::Latest, ApplyMode::Execute, &mut TracingSink)
//!         .await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod engine;
pub mod error;
pub mod executor;
pub mod graph;
pub mod progress;
pub mod resolver;
pub mod signal;
pub mod sync;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports
pub use backend::{AuxiliarySqlProvider, DdlBoundary, NoAuxiliarySql, SchemaBackend, SchemaEditor};
pub use engine::{DriftDetector, NoDrift, SyncEngine, SyncReport};
pub use error::{MigrateResult, MigrationError};
pub use executor::{ApplyMode, Direction, Plan, PlanExecutor, PlanStep, Target};
pub use graph::{HistoryGraph, Migration, MigrationId};
pub use progress::{NullSink, ProgressAction, ProgressEvent, ProgressSink, TracingSink};
pub use resolver::{ResolvedTargets, TargetRequest, ZERO, resolve_targets};
pub use signal::{NullBus, SignalBus};
pub use sync::{LegacySynchronizer, Manifest, SyncOutcome, build_manifest};
