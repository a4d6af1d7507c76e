//! Error types for the batchpress library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`] — **Fatal**: the operation cannot proceed at all
//!   (invalid configuration, output directory not writable). Returned as
//!   `Err(BatchError)` from the top-level workspace/export functions.
//!
//! * [`FileError`] — **Non-fatal**: a single file failed (undecodable
//!   payload, encoder glitch) but the rest of the batch is fine. Recorded on
//!   the owning [`crate::record::FileRecord`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad file.
//!
//! The separation lets callers decide their own tolerance: surface the first
//! per-file failure, log and continue, or collect all errors for a post-run
//! report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the batchpress library.
///
/// File-level failures use [`FileError`] and are stored on the owning
/// record rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not stage a payload into the scoped temp-file store.
    #[error("Failed to stage payload for '{name}': {source}")]
    StagingFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an exported output file.
    #[error("Failed to write output file '{path}': {source}")]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file.
///
/// Stored on the [`crate::record::FileRecord`] as its failure message when
/// the strategy fails. The overall run continues past any number of these.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The payload could not be interpreted as the expected type.
    #[error("could not decode payload: {detail}")]
    Decode { detail: String },

    /// The transformation produced no usable output.
    #[error("re-encoding produced no output: {detail}")]
    Encode { detail: String },

    /// An operation referenced a record id that is no longer present.
    ///
    /// Benign: removal during a run is allowed, so lookups treat a missing
    /// record as a skip. This variant is never stored on a record and never
    /// surfaced to the user.
    #[error("no record with id {id}")]
    NotFound { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display_carries_detail() {
        let e = FileError::Decode {
            detail: "bad magic bytes".into(),
        };
        assert!(e.to_string().contains("bad magic bytes"));
    }

    #[test]
    fn encode_display_carries_detail() {
        let e = FileError::Encode {
            detail: "encoder returned zero bytes".into(),
        };
        assert!(e.to_string().contains("zero bytes"));
    }

    #[test]
    fn export_failed_names_the_path() {
        let e = BatchError::ExportFailed {
            path: PathBuf::from("/out/report-compressed.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("report-compressed.pdf"), "got: {msg}");
    }

    #[test]
    fn file_error_round_trips_through_serde() {
        let e = FileError::NotFound { id: "abc".into() };
        let json = serde_json::to_string(&e).unwrap();
        let back: FileError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, FileError::NotFound { ref id } if id == "abc"));
    }
}
