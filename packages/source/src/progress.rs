//! Progress reporting for the analysis pipeline.
//!
//! [`ProgressCallback`] keeps the pipeline stages independent of how (or
//! whether) progress is shown. The CLI renders it with `indicatif`; tests
//! and library callers use [`NullProgress`].

use std::sync::Arc;

/// Receives stage-level progress from the pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Set the number of stages that will run.
    fn set_total(&self, total: u64);

    /// Advance by `delta` completed stages.
    fn inc(&self, delta: u64);

    /// Name the stage currently running.
    fn set_message(&self, msg: String);

    /// Mark the run as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
