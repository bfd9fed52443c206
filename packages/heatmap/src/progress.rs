//! Progress reporting for the geocoding fan-out.
//!
//! The pipeline only knows about [`ProgressCallback`]; the CLI plugs in an
//! `indicatif` bar and the server, which has no terminal, passes
//! [`null_progress`].

use std::sync::Arc;

/// Receives progress updates while reports are being geocoded.
///
/// Implementations must be thread-safe; lookups complete on whichever task
/// the runtime polls them from.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of lookups expected.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` lookups.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
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

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
