//! Configuration types for flipbook rendering.
//!
//! All rendering behaviour is controlled through [`RenderConfig`], built via
//! its [`RenderConfigBuilder`]. The layout constants used by
//! [`crate::layout::dimensions`] are fixed and live in [`crate::layout`];
//! only the knobs that change what gets decoded and when it gets published
//! are configurable here.

use crate::error::FlipbookError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Fixed multiplier applied to a page's native size when rasterising.
///
/// Not adaptive to the viewport: a 1.5× raster costs more memory but stays
/// crisp when the page-flip surface zooms.
pub const DEFAULT_SCALE: f32 = 1.5;

/// JPEG quality (1–100) used for every page raster.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Configuration for a render session.
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use flipbook_render::RenderConfig;
///
/// let config = RenderConfig::builder()
///     .jpeg_quality(80)
///     .publish_every(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.publish_every, 4);
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Scale factor relative to native page size. Range: 0.25–4.0. Default: 1.5.
    pub scale: f32,

    /// JPEG quality. Range: 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// How many freshly produced pages the background viewer accumulates
    /// before publishing a new snapshot. Default: 1 (publish every page).
    ///
    /// Larger values mean fewer UI refreshes on long documents. Publication
    /// order is unaffected, and a final snapshot is always published when
    /// rendering finishes.
    pub publish_every: usize,

    /// Download timeout for URL references in seconds. Default: 120.
    pub fetch_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional progress callback fired as pages are produced.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            publish_every: 1,
            fetch_timeout_secs: 120,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("scale", &self.scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("publish_every", &self.publish_every)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RenderProgressCallback>"),
            )
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn publish_every(mut self, pages: usize) -> Self {
        self.config.publish_every = pages.max(1);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, FlipbookError> {
        let c = &self.config;
        if !c.scale.is_finite() || !(0.25..=4.0).contains(&c.scale) {
            return Err(FlipbookError::InvalidConfig(format!(
                "Scale must be 0.25–4.0, got {}",
                c.scale
            )));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(FlipbookError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.fetch_timeout_secs == 0 {
            return Err(FlipbookError::InvalidConfig(
                "Fetch timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
