//! Configuration types for batch compression.
//!
//! All run behaviour is controlled through [`CompressionConfig`], built via
//! its [`CompressionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise the plain-data
//! pieces for logging, and diff two runs to understand why their outputs
//! differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest. Two presets mirror the two
//! tool surfaces: [`CompressionConfig::image_defaults`] and
//! [`CompressionConfig::pdf_defaults`].

use crate::error::BatchError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for a compression run.
///
/// Built via [`CompressionConfig::builder()`] or one of the presets.
///
/// # Example
/// ```rust
/// use batchpress::CompressionConfig;
///
/// let config = CompressionConfig::builder()
///     .quality(65)
///     .inter_file_pause_ms(0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CompressionConfig {
    /// Overall quality factor, 1–100, higher = larger/better. Default: 80
    /// for the image preset, 70 for the PDF preset.
    ///
    /// For the pixel re-encoder this maps directly onto the JPEG encoder's
    /// quality parameter. 70–85 is the sweet spot for web images; above 90
    /// the output can exceed the original for already-compressed sources.
    pub quality: u8,

    /// Quality factor for images embedded in documents, 1–100. Default: 75.
    ///
    /// Carried for the document path's configuration surface; the current
    /// document strategy does not consume it (see [`crate::strategy::SimulatedShrink`]).
    pub image_quality: u8,

    /// Output-format hint for the image path. Default: [`OutputFormat::Auto`].
    ///
    /// Advisory: the pixel re-encoder currently always emits baseline JPEG.
    /// The hint exists so shells can persist a user preference ahead of a
    /// multi-encoder release.
    pub output_format: OutputFormat,

    /// Keep embedded metadata (EXIF, XMP) in the output. Default: false.
    ///
    /// Accepted but not honoured: the decode/re-encode round trip discards
    /// metadata unconditionally, so `true` has no effect today.
    pub preserve_metadata: bool,

    /// Downscale oversized images. Default: true (image preset).
    ///
    /// Accepted but inert: output dimensions always equal input dimensions.
    pub resize: bool,

    /// Emit progressive JPEGs. Default: true (image preset). Inert.
    pub progressive: bool,

    /// Drop ICC colour profiles. Default: false.
    ///
    /// Inert as a toggle — the re-encode round trip already drops profiles.
    pub strip_color_profile: bool,

    /// Subset and compress embedded fonts (document path). Default: true
    /// (PDF preset). Inert.
    pub optimize_fonts: bool,

    /// Flatten interactive form fields (document path). Default: false. Inert.
    pub flatten_forms: bool,

    /// Strip comments and annotations (document path). Default: false. Inert.
    pub remove_annotations: bool,

    /// Convert coloured elements to grayscale (document path). Default:
    /// false. Inert.
    pub grayscale: bool,

    /// Pause between records in milliseconds. Default: 300.
    ///
    /// Throttles the work rate so per-file progress stays legible in a
    /// shell; it is not a correctness requirement. Set to 0 in tests.
    pub inter_file_pause_ms: u64,

    /// Delay between synthetic progress ticks in milliseconds. Default: 50.
    ///
    /// Only the simulated document strategy emits intermediate ticks; the
    /// pixel re-encoder reports start and completion only.
    pub progress_tick_ms: u64,

    /// Progress event receiver for the run. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::image_defaults()
    }
}

impl fmt::Debug for CompressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionConfig")
            .field("quality", &self.quality)
            .field("image_quality", &self.image_quality)
            .field("output_format", &self.output_format)
            .field("preserve_metadata", &self.preserve_metadata)
            .field("resize", &self.resize)
            .field("progressive", &self.progressive)
            .field("strip_color_profile", &self.strip_color_profile)
            .field("optimize_fonts", &self.optimize_fonts)
            .field("flatten_forms", &self.flatten_forms)
            .field("remove_annotations", &self.remove_annotations)
            .field("grayscale", &self.grayscale)
            .field("inter_file_pause_ms", &self.inter_file_pause_ms)
            .field("progress_tick_ms", &self.progress_tick_ms)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl CompressionConfig {
    /// Defaults for the image tool surface: quality 80, resize and
    /// progressive on, metadata not preserved.
    pub fn image_defaults() -> Self {
        Self {
            quality: 80,
            image_quality: 75,
            output_format: OutputFormat::Auto,
            preserve_metadata: false,
            resize: true,
            progressive: true,
            strip_color_profile: false,
            optimize_fonts: false,
            flatten_forms: false,
            remove_annotations: false,
            grayscale: false,
            inter_file_pause_ms: 300,
            progress_tick_ms: 50,
            progress_callback: None,
        }
    }

    /// Defaults for the document tool surface: overall quality 70, embedded
    /// image quality 75, font optimisation on.
    pub fn pdf_defaults() -> Self {
        Self {
            quality: 70,
            image_quality: 75,
            output_format: OutputFormat::Auto,
            preserve_metadata: false,
            resize: false,
            progressive: false,
            strip_color_profile: false,
            optimize_fonts: true,
            flatten_forms: false,
            remove_annotations: false,
            grayscale: false,
            inter_file_pause_ms: 300,
            progress_tick_ms: 50,
            progress_callback: None,
        }
    }

    /// Create a new builder starting from the image defaults.
    pub fn builder() -> CompressionConfigBuilder {
        CompressionConfigBuilder {
            config: Self::image_defaults(),
        }
    }

    /// Continue configuring from this value.
    pub fn to_builder(self) -> CompressionConfigBuilder {
        CompressionConfigBuilder { config: self }
    }
}

/// Builder for [`CompressionConfig`].
#[derive(Debug)]
pub struct CompressionConfigBuilder {
    config: CompressionConfig,
}

impl CompressionConfigBuilder {
    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q.clamp(1, 100);
        self
    }

    pub fn image_quality(mut self, q: u8) -> Self {
        self.config.image_quality = q.clamp(1, 100);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn preserve_metadata(mut self, v: bool) -> Self {
        self.config.preserve_metadata = v;
        self
    }

    pub fn resize(mut self, v: bool) -> Self {
        self.config.resize = v;
        self
    }

    pub fn progressive(mut self, v: bool) -> Self {
        self.config.progressive = v;
        self
    }

    pub fn strip_color_profile(mut self, v: bool) -> Self {
        self.config.strip_color_profile = v;
        self
    }

    pub fn optimize_fonts(mut self, v: bool) -> Self {
        self.config.optimize_fonts = v;
        self
    }

    pub fn flatten_forms(mut self, v: bool) -> Self {
        self.config.flatten_forms = v;
        self
    }

    pub fn remove_annotations(mut self, v: bool) -> Self {
        self.config.remove_annotations = v;
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.config.grayscale = v;
        self
    }

    pub fn inter_file_pause_ms(mut self, ms: u64) -> Self {
        self.config.inter_file_pause_ms = ms;
        self
    }

    pub fn progress_tick_ms(mut self, ms: u64) -> Self {
        self.config.progress_tick_ms = ms;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompressionConfig, BatchError> {
        let c = &self.config;
        if c.quality < 1 || c.quality > 100 {
            return Err(BatchError::InvalidConfig(format!(
                "quality must be 1–100, got {}",
                c.quality
            )));
        }
        if c.image_quality < 1 || c.image_quality > 100 {
            return Err(BatchError::InvalidConfig(format!(
                "image quality must be 1–100, got {}",
                c.image_quality
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output-format hint for the image path.
///
/// Advisory in this release — see [`CompressionConfig::output_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the original container. (default)
    #[default]
    Auto,
    Jpg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Auto => "auto",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(OutputFormat::Auto),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            other => Err(BatchError::InvalidConfig(format!(
                "unknown output format '{other}' (expected auto|jpg|png|webp)"
            ))),
        }
    }
}
