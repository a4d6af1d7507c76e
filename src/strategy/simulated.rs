//! Simulated shrink: a stand-in document strategy.
//!
//! **This is not compression.** The output is a zero-filled placeholder
//! whose size is the original size scaled by a pseudo-random ratio in
//! `[0.3, 0.8)`; it contains no document structure and must never be
//! treated as a legitimate compressed document. The strategy exists so the
//! rest of the pipeline — intake, runner, progress, export — can be built
//! and exercised end-to-end while a real document recompressor is pending.
//! Replacing it is a drop-in swap behind [`CompressionStrategy`].
//!
//! Because there is no real work to report on, intermediate progress is
//! synthetic: fixed 2 % increments with a configurable tick delay, purely
//! for UI feedback.

use crate::config::CompressionConfig;
use crate::error::FileError;
use crate::record::SourceFile;
use crate::strategy::{CompressionStrategy, ProgressFn};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// The document-path stand-in strategy.
#[derive(Debug, Clone, Default)]
pub struct SimulatedShrink;

impl SimulatedShrink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompressionStrategy for SimulatedShrink {
    fn name(&self) -> &'static str {
        "simulated-shrink"
    }

    fn accepts(&self, mime_type: &str, extension: Option<&str>) -> bool {
        mime_type == "application/pdf"
            || matches!(extension.map(|e| e.to_ascii_lowercase()).as_deref(), Some("pdf"))
    }

    fn probe_page_count(&self, _source: &SourceFile) -> Option<u32> {
        // Placeholder metadata to match the placeholder output.
        Some(rand::rng().random_range(1..=20))
    }

    async fn compress(
        &self,
        source: &SourceFile,
        config: &CompressionConfig,
        progress: &ProgressFn<'_>,
    ) -> Result<Vec<u8>, FileError> {
        // Draw the ratio up front; the RNG must not be held across awaits.
        let ratio: f64 = { rand::rng().random_range(0.3..0.8) };
        let result_size = (source.len() as f64 * ratio).floor() as usize;
        debug!(
            "simulating shrink of '{}': ratio {:.3}, {} → {} bytes",
            source.name(),
            ratio,
            source.len(),
            result_size
        );

        for percent in (0..=100u8).step_by(2) {
            if config.progress_tick_ms > 0 {
                tokio::time::sleep(Duration::from_millis(config.progress_tick_ms)).await;
            }
            progress(percent);
        }

        Ok(vec![0u8; result_size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn fast_config() -> CompressionConfig {
        CompressionConfig::pdf_defaults()
            .to_builder()
            .progress_tick_ms(0)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn result_size_falls_in_the_advertised_range() {
        let source = SourceFile::from_bytes("report.pdf", vec![0u8; 2_000_000]);

        let out = SimulatedShrink::new()
            .compress(&source, &fast_config(), &|_| {})
            .await
            .expect("simulated shrink never fails");

        let size = out.len() as f64;
        assert!(size >= 0.3 * 2_000_000.0, "too small: {size}");
        assert!(size < 0.8 * 2_000_000.0, "too large: {size}");
    }

    #[tokio::test]
    async fn emits_even_progress_ticks_up_to_100() {
        let source = SourceFile::from_bytes("report.pdf", vec![0u8; 1_000]);
        let seen = Mutex::new(Vec::new());

        SimulatedShrink::new()
            .compress(&source, &fast_config(), &|p| seen.lock().unwrap().push(p))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 51);
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.iter().all(|p| p % 2 == 0));
    }

    #[tokio::test]
    async fn tick_count_is_stable_across_runs() {
        let source = SourceFile::from_bytes("a.pdf", vec![0u8; 10]);
        let ticks = AtomicUsize::new(0);

        SimulatedShrink::new()
            .compress(&source, &fast_config(), &|_| {
                ticks.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        assert_eq!(ticks.load(Ordering::SeqCst), 51);
    }

    #[test]
    fn probes_a_page_count_between_1_and_20() {
        let source = SourceFile::from_bytes("report.pdf", vec![0u8; 10]);
        for _ in 0..50 {
            let pages = SimulatedShrink::new().probe_page_count(&source).unwrap();
            assert!((1..=20).contains(&pages));
        }
    }

    #[test]
    fn accepts_pdfs_only() {
        let s = SimulatedShrink::new();
        assert!(s.accepts("application/pdf", Some("pdf")));
        assert!(s.accepts("application/octet-stream", Some("PDF")));
        assert!(!s.accepts("image/png", Some("png")));
    }
}
