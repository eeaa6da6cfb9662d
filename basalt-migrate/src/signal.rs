//! Lifecycle signals emitted around schema changes.

use basalt_schema::ModelDef;

/// Receives the two lifecycle notifications of an invocation.
///
/// Exactly one `pre_change` and one `post_change` fire per invocation,
/// whichever paths ran, including the no-op case (both with empty
/// payloads). Both calls are fire-and-forget: listener failures are the
/// listeners' responsibility and must not surface here.
pub trait SignalBus: Send + Sync {
    /// Fired before any DDL, with every model that may be created.
    fn pre_change(&self, candidates: &[ModelDef]);

    /// Fired after all changes, with the models actually created.
    fn post_change(&self, created: &[ModelDef]);
}

/// Bus with no listeners.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBus;

impl SignalBus for NullBus {
    fn pre_change(&self, _candidates: &[ModelDef]) {}

    fn post_change(&self, _created: &[ModelDef]) {}
}
