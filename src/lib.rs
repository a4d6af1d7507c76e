//! # batchpress
//!
//! Batch file compression as a small, inspectable pipeline: take a set of
//! user-selected files through intake, per-file transformation, progress
//! reporting, and result export, with strict resource accounting along the
//! way.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Intake     accept payloads into a Workspace (ids, previews, order)
//!  ├─ 2. Run        drive each record through the strategy, sequentially
//!  │                  • PixelReencode   images: decode → JPEG at quality
//!  │                  • SimulatedShrink documents: placeholder stand-in
//!  ├─ 3. Progress   per-file start/tick/complete/error callbacks
//!  └─ 4. Export     copy completed results to disk under derived names
//! ```
//!
//! One [`Workspace`] exists per file kind and owns its records exclusively;
//! the runner and exporter borrow it. Strategies are interchangeable behind
//! [`CompressionStrategy`], and the document strategy that ships here is a
//! **labelled stand-in** — see [`strategy::SimulatedShrink`] before
//! trusting its output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batchpress::{export_all, run, CompressionConfig, PixelReencode, SourceFile, Workspace};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workspace = Workspace::new(Arc::new(PixelReencode::new()));
//!     workspace.add(vec![SourceFile::from_path(Path::new("photo.jpg"))?])?;
//!
//!     let config = CompressionConfig::image_defaults();
//!     let report = run(&workspace, &config).await;
//!     eprintln!("{}/{} compressed", report.succeeded, report.eligible);
//!
//!     export_all(&workspace, Path::new("compressed"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `batchpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! batchpress = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod handle;
pub mod progress;
pub mod record;
pub mod runner;
pub mod strategy;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CompressionConfig, CompressionConfigBuilder, OutputFormat};
pub use error::{BatchError, FileError};
pub use export::{derive_output_name, export_all, export_one, format_bytes, savings_percent};
pub use handle::ResourceHandle;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{FileStatus, RecordId, RecordSummary, SourceFile};
pub use runner::{run, RunReport};
pub use strategy::{CompressionStrategy, FileKind, PixelReencode, ProgressFn, SimulatedShrink};
pub use workspace::{BatchSummary, Workspace};
