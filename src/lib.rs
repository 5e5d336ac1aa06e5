//! # flipbook-render
//!
//! Progressively rasterise PDF documents into JPEG page images for a
//! page-flip (flipbook) reader.
//!
//! ## Why this crate?
//!
//! A page-flip viewer wants every page as an image, but decoding a long PDF
//! up front leaves the reader staring at a spinner. This crate decodes one
//! page at a time, in order, and makes each page visible the moment it is
//! ready: the reader can open page 1 while page 40 is still being drawn.
//! Pages that fail to decode are skipped, never fatal.
//!
//! ## Pipeline Overview
//!
//! ```text
//! reference (path / URL)
//!  │
//!  ├─ 1. Input   classify the reference, read or download, check %PDF
//!  ├─ 2. Open    count pages via pdfium (spawn_blocking)
//!  ├─ 3. Render  rasterise page i at 1.5× (spawn_blocking, one at a time)
//!  ├─ 4. Encode  RGB → JPEG q90 → data:image/jpeg;base64 URL
//!  └─ 5. Append  push to the RenderSession; publish to the viewer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flipbook_render::{FlipbookViewer, RenderConfig, Viewport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderConfig::default();
//!     let mut viewer = FlipbookViewer::open("brochure.pdf", &config).await?;
//!     let size = viewer.dimensions(&Viewport::new(1280.0, 800.0));
//!     println!("{} pages, book size {}x{}", viewer.page_count(), size.width, size.height);
//!
//!     while viewer.changed().await {
//!         let p = viewer.progress();
//!         println!("page {} of {}", p.current, p.total);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flipbook` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! flipbook-render = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod gesture;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod renderer;
pub mod session;
pub mod stream;
pub mod viewer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RenderConfig, RenderConfigBuilder, DEFAULT_JPEG_QUALITY, DEFAULT_SCALE};
pub use convert::{
    inspect, page_file_name, render_document, render_document_with_decoder, render_from_bytes,
    render_sync, render_to_dir, render_to_dir_with_decoder,
};
pub use error::{FlipbookError, PageRenderError, SourceFailure};
pub use gesture::{classify_swipe, Point, Swipe, SwipeTracker, TouchEvent, SWIPE_THRESHOLD};
pub use layout::{dimensions, viewport_channel, Dimensions, Viewport, ViewportSource, WatchViewport};
pub use output::{DirOutput, DocumentMetadata, PageRaster, RenderOutput, RenderStats};
pub use pipeline::render::{PageDecoder, PdfiumDecoder};
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};
pub use renderer::{RenderStep, Renderer};
pub use session::{Progress, RenderSession, RenderSnapshot};
pub use stream::{open_stream, render_stream, PageStream};
pub use viewer::FlipbookViewer;
