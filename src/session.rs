//! Per-viewing render state.
//!
//! A [`RenderSession`] is the only mutable state of a flipbook: the rasters
//! produced so far, the page the reader is looking at, and the pages that
//! were skipped. It knows nothing about pdfium or Tokio, so navigation and
//! progress can be tested without a renderer or a display.
//!
//! Invariants:
//! * rasters are append-only and strictly increasing in page index;
//! * `current` is `None` until the first raster arrives, then always within
//!   `0..produced_count()`.

use crate::error::PageRenderError;
use crate::output::PageRaster;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reader position for a progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based index of the active page, 0 before the first raster.
    pub current: usize,
    /// Pages produced so far (not the document total while rendering).
    pub total: usize,
}

impl Progress {
    /// `current / total` in `0.0..=1.0`, for a progress bar.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Point-in-time copy of what the render loop has produced, published to the
/// display side. Rasters are shared, so cloning a snapshot is cheap.
#[derive(Debug, Clone, Default)]
pub struct RenderSnapshot {
    pub total_pages: usize,
    pub rasters: Vec<Arc<PageRaster>>,
    pub failures: Vec<PageRenderError>,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct RenderSession {
    reference: String,
    total_pages: Option<usize>,
    rasters: Vec<Arc<PageRaster>>,
    failures: Vec<PageRenderError>,
    current: Option<usize>,
    finished: bool,
}

impl RenderSession {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            total_pages: None,
            rasters: Vec::new(),
            failures: Vec::new(),
            current: None,
            finished: false,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Page count of the source, `None` until it has been opened.
    pub fn total_pages(&self) -> Option<usize> {
        self.total_pages
    }

    pub(crate) fn set_total_pages(&mut self, total: usize) {
        self.total_pages = Some(total);
    }

    pub fn produced_count(&self) -> usize {
        self.rasters.len()
    }

    pub fn rasters(&self) -> &[Arc<PageRaster>] {
        &self.rasters
    }

    pub fn raster(&self, position: usize) -> Option<&Arc<PageRaster>> {
        self.rasters.get(position)
    }

    /// Pages skipped so far, in the order they failed.
    pub fn failures(&self) -> &[PageRenderError] {
        &self.failures
    }

    /// `true` once every page index has been attempted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_raster(&self) -> Option<&Arc<PageRaster>> {
        self.current.and_then(|i| self.rasters.get(i))
    }

    /// Jump to `index`, clamped into the produced range. No-op while nothing
    /// has been produced.
    pub fn go_to(&mut self, index: usize) {
        if let Some(last) = self.rasters.len().checked_sub(1) {
            self.current = Some(index.min(last));
        }
    }

    /// Advance one page. No-op on the last produced page.
    pub fn next(&mut self) {
        if let Some(i) = self.current {
            if i + 1 < self.rasters.len() {
                self.current = Some(i + 1);
            }
        }
    }

    /// Go back one page. No-op on the first page.
    pub fn prev(&mut self) {
        if let Some(i) = self.current {
            self.current = Some(i.saturating_sub(1));
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.current.map_or(0, |i| i + 1),
            total: self.rasters.len(),
        }
    }

    /// Append a freshly produced raster.
    ///
    /// Returns `false` and leaves the session untouched when the raster's
    /// page index does not come after the last one.
    pub(crate) fn push_raster(&mut self, raster: Arc<PageRaster>) -> bool {
        if let Some(last) = self.rasters.last() {
            if raster.index <= last.index {
                return false;
            }
        }
        self.rasters.push(raster);
        if self.current.is_none() {
            self.current = Some(0);
        }
        true
    }

    pub(crate) fn record_failure(&mut self, error: PageRenderError) {
        self.failures.push(error);
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished = true;
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            total_pages: self.total_pages.unwrap_or(0),
            rasters: self.rasters.clone(),
            failures: self.failures.clone(),
            finished: self.finished,
        }
    }

    /// Bring a display-side session up to date with a published snapshot.
    ///
    /// Only rasters beyond the ones already held are appended, so the
    /// reader's current page is preserved.
    pub fn apply(&mut self, snapshot: &RenderSnapshot) {
        self.total_pages = Some(snapshot.total_pages);
        for raster in snapshot.rasters.iter().skip(self.rasters.len()) {
            self.push_raster(Arc::clone(raster));
        }
        if snapshot.failures.len() > self.failures.len() {
            self.failures
                .extend_from_slice(&snapshot.failures[self.failures.len()..]);
        }
        self.finished = snapshot.finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(index: usize) -> Arc<PageRaster> {
        Arc::new(PageRaster {
            index,
            width: 10,
            height: 14,
            data_url: format!("data:image/jpeg;base64,page{index}"),
        })
    }

    fn session_with(indices: &[usize]) -> RenderSession {
        let mut s = RenderSession::new("mag.pdf");
        for &i in indices {
            assert!(s.push_raster(raster(i)));
        }
        s
    }

    #[test]
    fn navigation_is_noop_before_first_raster() {
        let mut s = RenderSession::new("mag.pdf");
        s.next();
        s.prev();
        s.go_to(4);
        assert_eq!(s.current_index(), None);
        assert_eq!(s.progress(), Progress { current: 0, total: 0 });
        assert_eq!(s.progress().ratio(), 0.0);
    }

    #[test]
    fn first_raster_selects_page_zero() {
        let s = session_with(&[0]);
        assert_eq!(s.current_index(), Some(0));
        assert_eq!(s.current_raster().map(|r| r.index), Some(0));
    }

    #[test]
    fn next_and_prev_are_clamped() {
        let mut s = session_with(&[0, 1, 2]);
        s.prev();
        assert_eq!(s.current_index(), Some(0));
        s.next();
        s.next();
        assert_eq!(s.current_index(), Some(2));
        s.next();
        assert_eq!(s.current_index(), Some(2));
    }

    #[test]
    fn go_to_clamps_to_last_produced() {
        let mut s = session_with(&[0, 1, 2]);
        s.go_to(99);
        assert_eq!(s.current_index(), Some(2));
        s.go_to(1);
        assert_eq!(s.current_index(), Some(1));
    }

    #[test]
    fn progress_counts_produced_not_total() {
        let mut s = session_with(&[0, 1, 2]);
        s.set_total_pages(10);
        s.go_to(1);
        assert_eq!(s.progress(), Progress { current: 2, total: 3 });
        assert!((s.progress().ratio() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_order_raster_is_rejected() {
        let mut s = session_with(&[0, 3]);
        assert!(!s.push_raster(raster(2)));
        assert!(!s.push_raster(raster(3)));
        assert_eq!(s.produced_count(), 2);
        assert!(s.push_raster(raster(5)));
    }

    #[test]
    fn apply_appends_and_keeps_position() {
        let mut producer = session_with(&[0, 1]);
        producer.set_total_pages(4);

        let mut display = RenderSession::new("mag.pdf");
        display.apply(&producer.snapshot());
        display.next();
        assert_eq!(display.current_index(), Some(1));

        producer.record_failure(PageRenderError::DecodeFailed {
            page: 3,
            detail: "bad".into(),
        });
        producer.push_raster(raster(3));
        producer.mark_finished();
        display.apply(&producer.snapshot());

        assert_eq!(display.current_index(), Some(1));
        assert_eq!(display.produced_count(), 3);
        assert_eq!(display.failures().len(), 1);
        assert_eq!(display.total_pages(), Some(4));
        assert!(display.is_finished());

        // Re-applying the same snapshot changes nothing.
        display.apply(&producer.snapshot());
        assert_eq!(display.produced_count(), 3);
        assert_eq!(display.failures().len(), 1);
    }
}
