//! Streaming API: pull page rasters one at a time.
//!
//! [`render_stream`] wraps [`Renderer::render_next`] in a lazy
//! `Stream`: nothing is decoded until the consumer polls, and only one page
//! is ever in flight. Items arrive in strictly increasing page order.
//! Skipped pages surface as `Err(PageRenderError)` items; the stream keeps
//! going after them and ends once every page has been attempted.

use crate::config::RenderConfig;
use crate::error::{FlipbookError, PageRenderError};
use crate::output::PageRaster;
use crate::renderer::{RenderStep, Renderer};
use futures::stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page rasters.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<Arc<PageRaster>, PageRenderError>> + Send>>;

/// Turn an opened renderer into a pull-based stream of rasters.
pub fn render_stream(renderer: Renderer) -> PageStream {
    let s = stream::unfold(renderer, |mut renderer| async move {
        match renderer.render_next().await {
            RenderStep::Page(raster) => Some((Ok(raster), renderer)),
            RenderStep::Skipped(err) => Some((Err(err), renderer)),
            RenderStep::Done => None,
        }
    });
    Box::pin(s)
}

/// Open `reference` and stream its pages.
///
/// # Returns
/// - `Ok((page_count, PageStream))`
/// - `Err(FlipbookError)`: the source is unavailable or has no pages
pub async fn open_stream(
    reference: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<(usize, PageStream), FlipbookError> {
    let reference = reference.as_ref();
    info!("Starting streaming render: {}", reference);
    let renderer = Renderer::open(reference, config).await?;
    let total = renderer.page_count();
    Ok((total, render_stream(renderer)))
}
