//! Scoped resource handles for staged payloads.
//!
//! ## Why temp files with explicit release?
//!
//! Previews and compression results are transient byte buffers that must
//! outlive the call that produced them (a shell may export a result minutes
//! later) but must not outlive their record. Staging them in a
//! [`NamedTempFile`] gives every consumer a real filesystem path while the
//! RAII guard guarantees cleanup on every exit path, including panics —
//! release happens exactly once whether it is triggered by `remove`,
//! `clear`, or the handle simply going out of scope.
//!
//! Each allocation increments a shared liveness counter and each release
//! decrements it, so a workspace can account for every handle it ever
//! allocated. That makes the no-leak/no-double-release invariant directly
//! observable in tests instead of being a comment.

use crate::error::BatchError;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

/// An ownership-scoped reference to a staged byte payload.
///
/// Exclusively owned by its [`crate::record::FileRecord`]. The backing temp
/// file is deleted when [`release`](Self::release) is called or when the
/// handle is dropped, whichever comes first; the second of the two is a
/// no-op by construction.
#[derive(Debug)]
pub struct ResourceHandle {
    file: Option<NamedTempFile>,
    len: u64,
    live: Arc<AtomicUsize>,
}

impl ResourceHandle {
    /// Stage `bytes` into a fresh temp file and register it with the given
    /// liveness counter.
    pub(crate) fn create(
        name: &str,
        bytes: &[u8],
        live: Arc<AtomicUsize>,
    ) -> Result<Self, BatchError> {
        let mut file = NamedTempFile::new().map_err(|e| BatchError::StagingFailed {
            name: name.to_string(),
            source: e,
        })?;
        file.write_all(bytes).map_err(|e| BatchError::StagingFailed {
            name: name.to_string(),
            source: e,
        })?;

        live.fetch_add(1, Ordering::SeqCst);
        debug!("staged {} bytes for '{}'", bytes.len(), name);

        Ok(Self {
            file: Some(file),
            len: bytes.len() as u64,
            live,
        })
    }

    /// Path of the backing file, `None` once released.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    /// Byte length of the staged payload.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True for a zero-byte payload.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the backing resource is still allocated.
    pub fn is_live(&self) -> bool {
        self.file.is_some()
    }

    /// Release the backing resource now. Idempotent.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            self.live.fetch_sub(1, Ordering::SeqCst);
            // NamedTempFile deletes on drop; an unlink error here is not
            // actionable for the caller.
            drop(file);
        }
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release();
    }
}
