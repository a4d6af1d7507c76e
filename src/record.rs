//! Per-file state: the unit of work tracked through intake, transformation,
//! and export.
//!
//! A [`FileRecord`] moves through `Idle → Running → Done | Failed`; `Done`
//! and `Failed` are terminal for the runner (a failed record is only
//! reprocessed when the user triggers another run). The status-transition
//! methods keep the structural invariants in one place: a result handle and
//! result size exist exactly when the status is `Done`, and an error
//! message exists exactly when the status is `Failed`.

use crate::handle::ResourceHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque unique identifier for a record, assigned at intake and stable for
/// the record's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Accepted by intake, not yet processed.
    Idle,
    /// Currently being transformed by the strategy.
    Running,
    /// Transformation succeeded; a result is staged for export.
    Done,
    /// Transformation failed; see the record's error message.
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Idle => "idle",
            FileStatus::Running => "running",
            FileStatus::Done => "done",
            FileStatus::Failed => "failed",
        }
    }
}

/// An immutable reference to an original payload and its metadata.
///
/// The bytes are `Arc`-shared so strategies can move a cheap clone into a
/// blocking task without copying the payload.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    data: Arc<Vec<u8>>,
}

impl SourceFile {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(data),
        }
    }

    /// Read a payload from disk, using the file name component as the
    /// record name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shared reference to the payload, for handing to blocking tasks.
    pub fn shared_bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.data)
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Best-effort MIME type guessed from the extension.
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            Some("pdf") => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

/// The unit of work: one file's state through the pipeline.
///
/// Records live inside a [`crate::workspace::Workspace`] and are only
/// observed from outside through [`RecordSummary`] snapshots; the resource
/// handles never leave the record that owns them.
#[derive(Debug)]
pub struct FileRecord {
    pub(crate) id: RecordId,
    pub(crate) source: SourceFile,
    pub(crate) preview: Option<ResourceHandle>,
    pub(crate) status: FileStatus,
    pub(crate) progress: u8,
    pub(crate) original_size: u64,
    pub(crate) result_size: Option<u64>,
    pub(crate) result: Option<ResourceHandle>,
    pub(crate) error: Option<String>,
    pub(crate) pages: Option<u32>,
}

impl FileRecord {
    pub(crate) fn new(
        source: SourceFile,
        preview: Option<ResourceHandle>,
        pages: Option<u32>,
    ) -> Self {
        let original_size = source.len();
        Self {
            id: RecordId::new(),
            source,
            preview,
            status: FileStatus::Idle,
            progress: 0,
            original_size,
            result_size: None,
            result: None,
            error: None,
            pages,
        }
    }

    /// Enter `Running`. Clears a previous failure so a failed record can be
    /// reprocessed; any stale result is released first.
    pub(crate) fn begin(&mut self) {
        if let Some(mut result) = self.result.take() {
            result.release();
        }
        self.status = FileStatus::Running;
        self.progress = 0;
        self.result_size = None;
        self.error = None;
    }

    /// Enter `Done` with the staged result.
    pub(crate) fn complete(&mut self, result: ResourceHandle) {
        self.result_size = Some(result.len());
        self.result = Some(result);
        self.status = FileStatus::Done;
        self.progress = 100;
        self.error = None;
    }

    /// Enter `Failed` with a message; no result handle may remain.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if let Some(mut result) = self.result.take() {
            result.release();
        }
        self.result_size = None;
        self.status = FileStatus::Failed;
        self.error = Some(message.into());
    }

    /// Release every live handle this record owns.
    pub(crate) fn release_handles(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            preview.release();
        }
        if let Some(mut result) = self.result.take() {
            result.release();
        }
    }

    pub(crate) fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            name: self.source.name().to_string(),
            status: self.status,
            progress: self.progress,
            original_size: self.original_size,
            result_size: self.result_size,
            error: self.error.clone(),
            pages: self.pages,
        }
    }
}

/// A cloneable snapshot of one record, for shells and tests.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub name: String,
    pub status: FileStatus,
    pub progress: u8,
    pub original_size: u64,
    pub result_size: Option<u64>,
    pub error: Option<String>,
    pub pages: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn record(bytes: &[u8]) -> FileRecord {
        FileRecord::new(SourceFile::from_bytes("photo.jpg", bytes.to_vec()), None, None)
    }

    #[test]
    fn new_record_is_idle_with_original_size() {
        let r = record(b"abcdef");
        assert_eq!(r.status, FileStatus::Idle);
        assert_eq!(r.progress, 0);
        assert_eq!(r.original_size, 6);
        assert!(r.result.is_none() && r.result_size.is_none() && r.error.is_none());
    }

    #[test]
    fn complete_sets_done_with_result() {
        let live = std::sync::Arc::new(AtomicUsize::new(0));
        let mut r = record(b"abcdef");
        r.begin();
        let handle =
            ResourceHandle::create("photo.jpg", b"out", std::sync::Arc::clone(&live)).unwrap();
        r.complete(handle);

        assert_eq!(r.status, FileStatus::Done);
        assert_eq!(r.progress, 100);
        assert_eq!(r.result_size, Some(3));
        assert!(r.result.is_some() && r.error.is_none());
    }

    #[test]
    fn fail_sets_message_and_no_result() {
        let mut r = record(b"abcdef");
        r.begin();
        r.fail("could not decode payload");

        assert_eq!(r.status, FileStatus::Failed);
        assert!(r.result.is_none() && r.result_size.is_none());
        assert_eq!(r.error.as_deref(), Some("could not decode payload"));
    }

    #[test]
    fn begin_after_failure_clears_error() {
        let mut r = record(b"abcdef");
        r.begin();
        r.fail("boom");
        r.begin();

        assert_eq!(r.status, FileStatus::Running);
        assert!(r.error.is_none());
    }

    #[test]
    fn ids_are_unique() {
        let a = record(b"x");
        let b = record(b"x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn mime_type_from_extension() {
        let s = SourceFile::from_bytes("Scan.JPEG", vec![1]);
        assert_eq!(s.mime_type(), "image/jpeg");
        let s = SourceFile::from_bytes("doc.pdf", vec![1]);
        assert_eq!(s.mime_type(), "application/pdf");
        let s = SourceFile::from_bytes("notes", vec![1]);
        assert_eq!(s.mime_type(), "application/octet-stream");
    }
}
