//! The file workspace: intake, lifecycle, and resource accounting.
//!
//! A [`Workspace`] owns the record collection for one tool surface and is
//! constructed around the strategy that will process it — one workspace for
//! images, one for documents. It is the only component that allocates or
//! releases resource handles, which keeps the no-leak invariant in a single
//! place: every handle a workspace ever staged is either still live inside
//! a record or has been released exactly once, and
//! [`live_handles`](Workspace::live_handles) exposes the count.
//!
//! ## Sharing model
//!
//! The collection is mutated by exactly two actors: intake operations
//! (`add`/`remove`/`clear`) and the runner's status updates. A `Mutex`
//! around the record list makes each mutation atomic; the runner never
//! holds the lock across a suspension point, so user-triggered removal can
//! interleave with a run at any await. A removed record is simply missing
//! at the next lookup — updates for it are dropped, not errors.

use crate::error::BatchError;
use crate::handle::ResourceHandle;
use crate::record::{FileRecord, FileStatus, RecordId, RecordSummary, SourceFile};
use crate::strategy::CompressionStrategy;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Owns the [`FileRecord`] collection for one file kind.
pub struct Workspace {
    strategy: Arc<dyn CompressionStrategy>,
    records: Mutex<Vec<FileRecord>>,
    running: AtomicBool,
    live_handles: Arc<AtomicUsize>,
}

impl Workspace {
    /// Create an empty workspace around the given strategy.
    pub fn new(strategy: Arc<dyn CompressionStrategy>) -> Self {
        Self {
            strategy,
            records: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            live_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The strategy this workspace processes records with.
    pub fn strategy(&self) -> &Arc<dyn CompressionStrategy> {
        &self.strategy
    }

    /// Accept payloads into the workspace.
    ///
    /// Each payload becomes an `Idle` record in input order; the records are
    /// appended after any existing ones, and the runner processes them in
    /// exactly this order. A preview of the original is staged when the
    /// strategy supports previews. No type or size validation happens here —
    /// that is the intake filter's job, upstream.
    pub fn add(
        &self,
        sources: impl IntoIterator<Item = SourceFile>,
    ) -> Result<Vec<RecordId>, BatchError> {
        let mut staged = Vec::new();
        for source in sources {
            let preview = if self.strategy.supports_preview() {
                Some(ResourceHandle::create(
                    source.name(),
                    source.bytes(),
                    Arc::clone(&self.live_handles),
                )?)
            } else {
                None
            };
            let pages = self.strategy.probe_page_count(&source);
            staged.push(FileRecord::new(source, preview, pages));
        }

        let ids: Vec<RecordId> = staged.iter().map(|r| r.id).collect();
        let mut records = self.records.lock().unwrap();
        records.extend(staged);
        info!("accepted {} file(s), {} in workspace", ids.len(), records.len());
        Ok(ids)
    }

    /// Remove one record, releasing any handles it owns.
    ///
    /// Returns `false` for an unknown id; calling twice is a no-op the
    /// second time.
    pub fn remove(&self, id: RecordId) -> bool {
        let mut records = self.records.lock().unwrap();
        match records.iter().position(|r| r.id == id) {
            Some(index) => {
                let mut record = records.remove(index);
                record.release_handles();
                debug!("removed record {id} ('{}')", record.source.name());
                true
            }
            None => {
                debug!("remove: no record {id}");
                false
            }
        }
    }

    /// Remove every record, releasing every live handle.
    pub fn clear(&self) {
        let mut records = self.records.lock().unwrap();
        let count = records.len();
        for record in records.iter_mut() {
            record.release_handles();
        }
        records.clear();
        info!("cleared {count} record(s)");
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    /// Record ids in collection (= processing) order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.lock().unwrap().iter().map(|r| r.id).collect()
    }

    /// Snapshot of every record, in collection order.
    pub fn snapshot(&self) -> Vec<RecordSummary> {
        self.records.lock().unwrap().iter().map(|r| r.summary()).collect()
    }

    /// Snapshot of one record.
    pub fn get(&self, id: RecordId) -> Option<RecordSummary> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.summary())
    }

    /// Path of the staged preview for `id`, when one exists.
    pub fn preview_path(&self, id: RecordId) -> Option<PathBuf> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.preview.as_ref())
            .and_then(|h| h.path())
            .map(|p| p.to_path_buf())
    }

    /// Aggregate totals across the collection.
    pub fn summary(&self) -> BatchSummary {
        let records = self.records.lock().unwrap();
        let mut summary = BatchSummary {
            files: records.len(),
            ..BatchSummary::default()
        };
        for record in records.iter() {
            summary.total_original_size += record.original_size;
            summary.total_result_size += record.result_size.unwrap_or(0);
            match record.status {
                FileStatus::Done => summary.completed += 1,
                FileStatus::Failed => summary.failed += 1,
                _ => {}
            }
        }
        summary
    }

    /// Number of currently-live resource handles staged by this workspace.
    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // ── Runner-facing operations ─────────────────────────────────────────
    //
    // Every mutation below tolerates a missing record: removal during a run
    // is allowed, and an update for a vanished record is dropped silently.

    /// Claim the single run slot. Returns `false` when a run already holds it.
    pub(crate) fn try_begin_run(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn end_run(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub(crate) fn status_of(&self, id: RecordId) -> Option<FileStatus> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.status)
    }

    /// Move a record into `Running` and hand back its source for the
    /// strategy. `None` when the record was removed in the meantime.
    pub(crate) fn begin_record(&self, id: RecordId) -> Option<SourceFile> {
        let mut records = self.records.lock().unwrap();
        let record = records.iter_mut().find(|r| r.id == id)?;
        record.begin();
        Some(record.source.clone())
    }

    pub(crate) fn set_progress(&self, id: RecordId, percent: u8) -> bool {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.progress = percent.min(100);
                true
            }
            None => false,
        }
    }

    /// Stage `output` as the record's result and mark it `Done`.
    ///
    /// Returns `Ok(Some(size))` on success and `Ok(None)` when the record
    /// was removed mid-flight — the freshly staged handle is released on
    /// the spot in that case.
    pub(crate) fn complete_record(
        &self,
        id: RecordId,
        output: &[u8],
    ) -> Result<Option<u64>, BatchError> {
        let Some(name) = self.name_of(id) else {
            debug!("complete: record {id} no longer present");
            return Ok(None);
        };

        // Stage outside the lock; the temp-file write can block.
        let handle = ResourceHandle::create(&name, output, Arc::clone(&self.live_handles))?;
        let size = handle.len();

        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.complete(handle);
                Ok(Some(size))
            }
            None => {
                // Removed between staging and attach; dropping the handle
                // releases it.
                debug!("complete: record {id} removed while staging");
                Ok(None)
            }
        }
    }

    /// Mark a record `Failed`. Returns `false` when it no longer exists.
    pub(crate) fn fail_record(&self, id: RecordId, message: &str) -> bool {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.fail(message);
                true
            }
            None => false,
        }
    }

    /// Staged result path and original name, only for a `Done` record.
    pub(crate) fn result_of(&self, id: RecordId) -> Option<(PathBuf, String)> {
        let records = self.records.lock().unwrap();
        let record = records.iter().find(|r| r.id == id)?;
        if record.status != FileStatus::Done {
            return None;
        }
        let path = record.result.as_ref()?.path()?.to_path_buf();
        Some((path, record.source.name().to_string()))
    }

    fn name_of(&self, id: RecordId) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.source.name().to_string())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Records (and their handles) drop with the collection; nothing
        // survives the session.
        debug!("workspace dropped");
    }
}

/// Aggregate byte totals for a workspace, for summary rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub completed: usize,
    pub failed: usize,
    pub total_original_size: u64,
    pub total_result_size: u64,
}
