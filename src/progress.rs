//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::CompressionConfigBuilder::progress_callback`] to receive
//! real-time events as the runner processes each file.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a UI state store, or a terminal progress
//! bar — without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so a callback can aggregate
//! state behind its own synchronisation.

use std::sync::Arc;

/// Called by the runner as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The runner is strictly sequential, so events for a
/// batch arrive in order; implementations still must be `Send + Sync`
/// because runs happen on the async executor.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any file is processed.
    ///
    /// # Arguments
    /// * `total_files` — number of eligible files in this run
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file's transformation starts.
    ///
    /// # Arguments
    /// * `file_num`    — 1-indexed position within this run
    /// * `total_files` — eligible files in this run
    /// * `name`        — original file name
    fn on_file_start(&self, file_num: usize, total_files: usize, name: &str) {
        let _ = (file_num, total_files, name);
    }

    /// Called for each intermediate progress tick of the current file.
    ///
    /// Only strategies with a synthetic progress signal emit these; the
    /// pixel re-encoder goes straight from start to completion.
    fn on_file_progress(&self, file_num: usize, total_files: usize, percent: u8) {
        let _ = (file_num, total_files, percent);
    }

    /// Called when a file completes successfully.
    ///
    /// # Arguments
    /// * `result_size` — byte length of the staged result
    fn on_file_complete(&self, file_num: usize, total_files: usize, result_size: u64) {
        let _ = (file_num, total_files, result_size);
    }

    /// Called when a file's transformation fails.
    fn on_file_error(&self, file_num: usize, total_files: usize, error: &str) {
        let _ = (file_num, total_files, error);
    }

    /// Called once after the last eligible file has been attempted.
    ///
    /// # Arguments
    /// * `success_count` — files that completed without error
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CompressionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
