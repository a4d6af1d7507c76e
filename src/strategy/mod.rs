//! Interchangeable transformation strategies.
//!
//! The runner depends only on [`CompressionStrategy`], never on a concrete
//! variant. Two strategies ship with the crate:
//!
//! * [`PixelReencode`] — the image path: decode at native dimensions,
//!   re-encode at a quality factor.
//! * [`SimulatedShrink`] — the document path: a clearly-labelled stand-in
//!   that fabricates a plausible result size (see its module docs before
//!   relying on it for anything but UI plumbing).
//!
//! A workspace is constructed around one strategy; swapping in a new
//! implementation (say, a real document recompressor) touches nothing else.

mod reencode;
mod simulated;

pub use reencode::PixelReencode;
pub use simulated::SimulatedShrink;

use crate::config::CompressionConfig;
use crate::error::FileError;
use crate::record::SourceFile;
use async_trait::async_trait;
use std::path::Path;

/// Sink for intermediate progress ticks, 0–100.
///
/// The runner wires this to the record's progress field and the configured
/// progress callback; strategies with no intermediate signal simply never
/// call it.
pub type ProgressFn<'a> = dyn Fn(u8) + Send + Sync + 'a;

/// A transformation applied to each file of a batch.
#[async_trait]
pub trait CompressionStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy handles the given MIME type / extension.
    ///
    /// This is the same predicate the intake filter applies before payloads
    /// reach a workspace.
    fn accepts(&self, mime_type: &str, extension: Option<&str>) -> bool;

    /// Whether intake should stage a preview of the original payload.
    fn supports_preview(&self) -> bool {
        false
    }

    /// Optional page count probed at intake, for strategies that track one.
    fn probe_page_count(&self, _source: &SourceFile) -> Option<u32> {
        None
    }

    /// Transform `source` into an output payload.
    ///
    /// Failures are per-file: the runner records them on the owning record
    /// and moves on to the next file.
    async fn compress(
        &self,
        source: &SourceFile,
        config: &CompressionConfig,
        progress: &ProgressFn<'_>,
    ) -> Result<Vec<u8>, FileError>;
}

/// File kinds the intake filter recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// Classify a file name by extension: jpeg/jpg/png/gif/webp/svg are
    /// images, pdf is a document, everything else is unsupported.
    pub fn from_name(name: &str) -> Option<FileKind> {
        match file_extension(name)?.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" | "png" | "gif" | "webp" | "svg" => Some(FileKind::Image),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }
}

/// Extension of `filename`, if any.
pub fn file_extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}
