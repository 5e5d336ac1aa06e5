//! Image encoding: `DynamicImage` → JPEG → `data:` URL wrapped in a [`PageRaster`].
//!
//! The page-flip surface shows each page as an `<img>`, so the raster is
//! delivered as a data URL. JPEG keeps a 1.5× magazine page to a few hundred
//! kilobytes; at quality 90 text stays readable. JPEG has no alpha channel,
//! so the bitmap is flattened to RGB first.

use crate::output::{PageRaster, JPEG_DATA_URL_PREFIX};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Encode page `index` as a JPEG data URL at `quality` (1–100).
pub fn encode_page(
    index: usize,
    img: &DynamicImage,
    quality: u8,
) -> Result<PageRaster, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;

    let mut data_url = String::with_capacity(JPEG_DATA_URL_PREFIX.len() + buf.len() * 4 / 3 + 4);
    data_url.push_str(JPEG_DATA_URL_PREFIX);
    STANDARD.encode_string(&buf, &mut data_url);
    debug!(
        "Encoded page {} → {} bytes JPEG, {} bytes data URL",
        index + 1,
        buf.len(),
        data_url.len()
    );

    Ok(PageRaster {
        index,
        width: rgb.width(),
        height: rgb.height(),
        data_url,
    })
}
