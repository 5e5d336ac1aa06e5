//! Progress-callback trait for per-page render events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::RenderConfigBuilder::progress_callback`] to receive
//! events as the render loop produces (or skips) each page.
//!
//! Pages are rendered strictly in order, one at a time, so callbacks for a
//! single session never overlap. Implementations still have to be
//! `Send + Sync` because the background viewer drives the loop from a Tokio
//! task.
//!
//! # Example
//!
//! ```rust
//! use flipbook_render::{RenderConfig, RenderProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     ready: AtomicUsize,
//! }
//!
//! impl RenderProgressCallback for CountingCallback {
//!     fn on_page_ready(&self, page_num: usize, total_pages: usize, bytes: usize) {
//!         self.ready.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} ready ({} bytes)", page_num, total_pages, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { ready: AtomicUsize::new(0) });
//!
//! let config = RenderConfig::builder()
//!     .progress_callback(counter as Arc<dyn RenderProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the render loop as it works through the document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once after the source opened, before any page is decoded.
    fn on_open(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page raster has been appended to the session.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: total pages in the document
    /// * `bytes`: length of the encoded data URL
    fn on_page_ready(&self, page_num: usize, total_pages: usize, bytes: usize) {
        let _ = (page_num, total_pages, bytes);
    }

    /// Called when a page is skipped because it failed to decode or encode.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page index has been attempted.
    ///
    /// # Arguments
    /// * `total_pages`: total pages in the document
    /// * `success_count`: pages that produced a raster
    fn on_render_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;
