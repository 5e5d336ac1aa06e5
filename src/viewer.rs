//! Background flipbook viewer.
//!
//! [`FlipbookViewer`] moves the render loop onto a Tokio task and keeps the
//! display-side [`RenderSession`] for the caller. The loop is the only
//! writer of the produced rasters; it publishes [`RenderSnapshot`]s through
//! a `watch` channel and the viewer applies them on [`FlipbookViewer::refresh`]
//! or [`FlipbookViewer::changed`]. Navigation, progress, layout and touch
//! handling all act on the display-side session.
//!
//! Closing (or dropping) the viewer closes the channel. The loop checks for
//! that before each decode and after it: no further page is started, and a
//! decode already in flight finishes and is thrown away.

use crate::config::RenderConfig;
use crate::error::FlipbookError;
use crate::gesture::{Swipe, SwipeTracker, TouchEvent};
use crate::layout::{Dimensions, ViewportSource};
use crate::output::PageRaster;
use crate::renderer::{RenderStep, Renderer};
use crate::session::{Progress, RenderSession, RenderSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct FlipbookViewer {
    session: RenderSession,
    snapshots: watch::Receiver<RenderSnapshot>,
    task: JoinHandle<()>,
    swipe: SwipeTracker,
}

impl FlipbookViewer {
    /// Open `reference` and start rendering in the background.
    pub async fn open(reference: &str, config: &RenderConfig) -> Result<Self, FlipbookError> {
        let renderer = Renderer::open(reference, config).await?;
        Ok(Self::start(renderer, config.publish_every))
    }

    /// Start the background loop for an already opened renderer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(renderer: Renderer, publish_every: usize) -> Self {
        let initial = renderer.session().snapshot();
        let mut session = RenderSession::new(renderer.session().reference());
        session.apply(&initial);

        let (tx, snapshots) = watch::channel(initial);
        let task = tokio::spawn(render_loop(renderer, tx, publish_every.max(1)));

        Self {
            session,
            snapshots,
            task,
            swipe: SwipeTracker::default(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.session.total_pages().unwrap_or(0)
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Apply the latest published snapshot, if there is one the viewer has
    /// not seen yet. Returns `true` when something was applied.
    pub fn refresh(&mut self) -> bool {
        let snapshot = self.snapshots.borrow_and_update();
        if !snapshot.has_changed() {
            return false;
        }
        self.session.apply(&snapshot);
        true
    }

    /// Wait for the next snapshot and apply it.
    ///
    /// Returns `false` once the render loop has exited and every snapshot
    /// it published has been applied.
    pub async fn changed(&mut self) -> bool {
        if self.snapshots.changed().await.is_err() {
            return false;
        }
        let snapshot = self.snapshots.borrow_and_update();
        self.session.apply(&snapshot);
        true
    }

    pub fn current_raster(&self) -> Option<&Arc<PageRaster>> {
        self.session.current_raster()
    }

    pub fn next(&mut self) {
        self.session.next();
    }

    pub fn prev(&mut self) {
        self.session.prev();
    }

    pub fn go_to(&mut self, index: usize) {
        self.session.go_to(index);
    }

    pub fn progress(&self) -> Progress {
        self.session.progress()
    }

    /// Flipbook size for the viewport currently reported by `viewport`.
    pub fn dimensions(&self, viewport: &dyn ViewportSource) -> Dimensions {
        viewport.viewport().dimensions()
    }

    /// Feed a raw touch event. Swipes only navigate on compact viewports;
    /// on wide ones any touch in progress is dropped.
    pub fn handle_touch(
        &mut self,
        event: TouchEvent,
        viewport: &dyn ViewportSource,
    ) -> Option<Swipe> {
        if !viewport.viewport().is_compact() {
            self.swipe.feed(TouchEvent::Cancel);
            return None;
        }
        let swipe = self.swipe.feed(event)?;
        match swipe {
            Swipe::Next => self.session.next(),
            Swipe::Prev => self.session.prev(),
        }
        Some(swipe)
    }

    /// Stop rendering and hand back the display-side session.
    ///
    /// Waits for a decode already in flight to finish; its page is discarded.
    pub async fn close(self) -> RenderSession {
        let FlipbookViewer {
            session,
            snapshots,
            task,
            ..
        } = self;
        drop(snapshots);
        if let Err(e) = task.await {
            warn!("Render loop ended abnormally: {}", e);
        }
        session
    }
}

async fn render_loop(
    mut renderer: Renderer,
    tx: watch::Sender<RenderSnapshot>,
    publish_every: usize,
) {
    let mut unpublished = 0usize;
    loop {
        if tx.is_closed() {
            debug!("Viewer closed; render loop stopping");
            return;
        }

        let step = renderer.render_next().await;

        if tx.is_closed() {
            debug!("Viewer closed during decode; discarding result");
            return;
        }

        match step {
            RenderStep::Page(_) => {
                unpublished += 1;
                if unpublished >= publish_every {
                    tx.send_replace(renderer.session().snapshot());
                    unpublished = 0;
                }
            }
            // Failures ride along with the next published snapshot.
            RenderStep::Skipped(_) => {}
            RenderStep::Done => {
                tx.send_replace(renderer.session().snapshot());
                return;
            }
        }
    }
}
