//! Output types: page rasters, document metadata and render statistics.

use crate::error::PageRenderError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Prefix of every raster data URL.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// One decoded and JPEG-encoded page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRaster {
    /// 0-based page index in the source document.
    pub index: usize,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// `data:image/jpeg;base64,…`, ready for an `<img src>`.
    pub data_url: String,
}

impl PageRaster {
    /// 1-based page number.
    pub fn page_num(&self) -> usize {
        self.index + 1
    }

    /// Decode the data URL back into raw JPEG bytes.
    pub fn jpeg_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = self
            .data_url
            .strip_prefix(JPEG_DATA_URL_PREFIX)
            .unwrap_or(&self.data_url);
        STANDARD.decode(payload)
    }
}

/// Document-level metadata read without rendering any page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Timing and success counters for a completed render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderStats {
    pub total_pages: usize,
    pub rendered_pages: usize,
    pub skipped_pages: usize,
    /// Sum of data URL lengths across rendered pages.
    pub total_bytes: usize,
    pub fetch_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything produced by an eager [`crate::convert::render_document`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Rendered pages in page order. Skipped pages are absent.
    pub pages: Vec<PageRaster>,
    /// One entry per skipped page.
    pub failures: Vec<PageRenderError>,
    pub stats: RenderStats,
}

impl RenderOutput {
    pub(crate) fn from_rasters(
        rasters: &[Arc<PageRaster>],
        failures: Vec<PageRenderError>,
        stats: RenderStats,
    ) -> Self {
        Self {
            pages: rasters.iter().map(|r| PageRaster::clone(r)).collect(),
            failures,
            stats,
        }
    }
}

/// Result of [`crate::convert::render_to_dir`]: the files written, plus the
/// pages that could not be rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirOutput {
    /// Paths of the written page images, in page order.
    pub files: Vec<PathBuf>,
    /// One entry per skipped page. No file exists for these.
    pub failures: Vec<PageRenderError>,
    pub stats: RenderStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_bytes_strips_prefix() {
        let raster = PageRaster {
            index: 4,
            width: 2,
            height: 2,
            data_url: format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode([0xFF, 0xD8, 0xFF])),
        };
        assert_eq!(raster.page_num(), 5);
        assert_eq!(raster.jpeg_bytes().unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn jpeg_bytes_rejects_garbage() {
        let raster = PageRaster {
            index: 0,
            width: 1,
            height: 1,
            data_url: format!("{JPEG_DATA_URL_PREFIX}!!not base64!!"),
        };
        assert!(raster.jpeg_bytes().is_err());
    }
}
