//! Pipeline stages for turning a document reference into page rasters.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode
//! (URL/path)  (pdfium)  (JPEG data URL)
//! ```
//!
//! 1. [`input`]: classify the reference and fetch the PDF bytes
//! 2. [`render`]: count pages and rasterise one page at a time; blocking,
//!    so the render loop calls it from `spawn_blocking`
//! 3. [`encode`]: JPEG-encode a bitmap into a [`crate::output::PageRaster`]

pub mod encode;
pub mod input;
pub mod render;
