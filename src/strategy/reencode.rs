//! Pixel re-encode: decode → full-surface re-encode at a quality factor.
//!
//! ## Why spawn_blocking?
//!
//! Decoding and re-encoding are CPU-bound; running them inline would stall
//! the async executor for the duration of a large decode. Moving the work
//! onto the blocking pool keeps the runner's timeline responsive to
//! progress events and user-triggered removal.
//!
//! The round trip decodes the payload into a pixel surface at its native
//! dimensions and re-encodes that surface as baseline JPEG at
//! `quality/100`. The original container, embedded metadata, and colour
//! profile do not survive the trip. Output dimensions always equal input
//! dimensions.

use crate::config::CompressionConfig;
use crate::error::FileError;
use crate::record::SourceFile;
use crate::strategy::{CompressionStrategy, ProgressFn};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

/// The image-path strategy: one built-in re-encode, quality slider only.
#[derive(Debug, Clone, Default)]
pub struct PixelReencode;

impl PixelReencode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompressionStrategy for PixelReencode {
    fn name(&self) -> &'static str {
        "pixel-reencode"
    }

    fn accepts(&self, mime_type: &str, extension: Option<&str>) -> bool {
        mime_type.starts_with("image/")
            || matches!(
                extension.map(|e| e.to_ascii_lowercase()).as_deref(),
                Some("jpeg") | Some("jpg") | Some("png") | Some("gif") | Some("webp")
                    | Some("svg")
            )
    }

    fn supports_preview(&self) -> bool {
        true
    }

    async fn compress(
        &self,
        source: &SourceFile,
        config: &CompressionConfig,
        _progress: &ProgressFn<'_>,
    ) -> Result<Vec<u8>, FileError> {
        let quality = config.quality.clamp(1, 100);
        let data = source.shared_bytes();
        let name = source.name().to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, FileError> {
            let img = image::load_from_memory(&data).map_err(|e| FileError::Decode {
                detail: e.to_string(),
            })?;
            debug!(
                "decoded '{}' → {}x{} px, re-encoding at quality {}",
                name,
                img.width(),
                img.height(),
                quality
            );

            // JPEG has no alpha channel; flatten before encoding.
            let rgb = img.to_rgb8();
            let mut output = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
            encoder.encode_image(&rgb).map_err(|e| FileError::Encode {
                detail: e.to_string(),
            })?;

            if output.is_empty() {
                return Err(FileError::Encode {
                    detail: "encoder produced no bytes".into(),
                });
            }
            Ok(output)
        })
        .await
        .map_err(|e| FileError::Encode {
            detail: format!("encode task panicked: {e}"),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_payload(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
        }));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("png encode");
        buf
    }

    #[tokio::test]
    async fn reencodes_a_png_to_jpeg() {
        let source = SourceFile::from_bytes("grid.png", png_payload(64, 64));
        let config = CompressionConfig::image_defaults();

        let out = PixelReencode::new()
            .compress(&source, &config, &|_| {})
            .await
            .expect("re-encode should succeed");

        assert!(!out.is_empty());
        // JPEG SOI marker
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        // Dimensions are preserved through the round trip.
        let back = image::load_from_memory(&out).unwrap();
        assert_eq!((back.width(), back.height()), (64, 64));
    }

    #[tokio::test]
    async fn lower_quality_yields_smaller_output() {
        let source = SourceFile::from_bytes("grid.png", png_payload(128, 128));

        let high = PixelReencode::new()
            .compress(
                &source,
                &CompressionConfig::builder().quality(95).build().unwrap(),
                &|_| {},
            )
            .await
            .unwrap();
        let low = PixelReencode::new()
            .compress(
                &source,
                &CompressionConfig::builder().quality(10).build().unwrap(),
                &|_| {},
            )
            .await
            .unwrap();

        assert!(
            low.len() < high.len(),
            "quality 10 ({}) should be smaller than quality 95 ({})",
            low.len(),
            high.len()
        );
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_decode_error() {
        let source = SourceFile::from_bytes("junk.jpg", vec![0u8; 256]);
        let config = CompressionConfig::image_defaults();

        let err = PixelReencode::new()
            .compress(&source, &config, &|_| {})
            .await
            .expect_err("garbage should not decode");
        assert!(matches!(err, FileError::Decode { .. }));
    }

    #[test]
    fn accepts_image_types_only() {
        let s = PixelReencode::new();
        assert!(s.accepts("image/png", Some("png")));
        assert!(s.accepts("image/svg+xml", Some("svg")));
        assert!(s.accepts("application/octet-stream", Some("JPG")));
        assert!(!s.accepts("application/pdf", Some("pdf")));
        assert!(!s.accepts("text/plain", None));
    }
}
