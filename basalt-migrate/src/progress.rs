//! Progress reporting for plan execution.
//!
//! The plan executor reports around every step it carries out: a `*Start`
//! event strictly before the step's DDL or state change, and a
//! `*Success` event after it. When execution fails mid-plan there is no
//! success event for the failing step; the failure propagates as an
//! error instead.

use tracing::info;

use crate::graph::MigrationId;

/// What happened to a migration during plan execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressAction {
    /// A forward application is about to run.
    ApplyStart,
    /// A forward application completed.
    ApplySuccess,
    /// A reversal is about to run.
    UnapplyStart,
    /// A reversal completed.
    UnapplySuccess,
}

/// One progress event emitted by the plan executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// What happened.
    pub action: ProgressAction,
    /// The migration it happened to.
    pub migration: MigrationId,
    /// True when the step was recorded without running its DDL.
    pub fake: bool,
}

impl ProgressEvent {
    /// Create a new event.
    pub fn new(action: ProgressAction, migration: MigrationId, fake: bool) -> Self {
        Self {
            action,
            migration,
            fake,
        }
    }
}

/// Sink for progress events.
pub trait ProgressSink: Send {
    /// Receive one event. Reporting is best-effort and must not fail.
    fn report(&mut self, event: &ProgressEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&mut self, _event: &ProgressEvent) {}
}

/// Sink that logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&mut self, event: &ProgressEvent) {
        let migration = &event.migration;
        match event.action {
            ProgressAction::ApplyStart => info!(%migration, "applying"),
            ProgressAction::UnapplyStart => info!(%migration, "unapplying"),
            ProgressAction::ApplySuccess | ProgressAction::UnapplySuccess => {
                if event.fake {
                    info!(%migration, "done (faked)");
                } else {
                    info!(%migration, "done");
                }
            }
        }
    }
}
