//! Progress reporting trait for crawls.
//!
//! Defines a [`ProgressCallback`] trait that decouples progress reporting
//! from any specific rendering backend (an `indicatif` bar in the CLI,
//! silence in tests). Implementations are provided upstream in crates that
//! choose a rendering strategy.

use std::sync::Arc;

/// Trait for reporting crawl progress, one unit per tile.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected number of tiles (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` tiles.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op implementation of [`ProgressCallback`].
///
/// Used when the crawl is not verbose and in tests.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
