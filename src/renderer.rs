//! The incremental render loop: one page per [`Renderer::render_next`] call.
//!
//! Pages are produced strictly in order and never in parallel: each step
//! appends to the session before the next decode starts, so page `i` is
//! always visible before page `i + 1` exists. A page that fails is recorded
//! and skipped; it never aborts the session.

use crate::config::RenderConfig;
use crate::error::{FlipbookError, PageRenderError};
use crate::output::PageRaster;
use crate::pipeline::render::{PageDecoder, PdfiumDecoder};
use crate::pipeline::{encode, input};
use crate::session::RenderSession;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one [`Renderer::render_next`] call.
#[derive(Debug, Clone)]
pub enum RenderStep {
    /// A page was decoded and appended to the session.
    Page(Arc<PageRaster>),
    /// A page failed and was skipped; the next call moves on.
    Skipped(PageRenderError),
    /// Every page index has been attempted.
    Done,
}

/// Owns a render session and the decoder feeding it.
pub struct Renderer {
    decoder: Arc<dyn PageDecoder>,
    config: RenderConfig,
    session: RenderSession,
    total_pages: usize,
    next_index: usize,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("reference", &self.session.reference())
            .field("total_pages", &self.total_pages)
            .field("next_index", &self.next_index)
            .finish()
    }
}

impl Renderer {
    /// Fetch `reference`, open it with pdfium and report its page count
    /// through [`Renderer::page_count`].
    ///
    /// # Errors
    /// * [`FlipbookError::SourceUnavailable`]: fetch failed, not a PDF,
    ///   corrupt, or password problems
    /// * [`FlipbookError::EmptyDocument`]: zero pages
    pub async fn open(reference: &str, config: &RenderConfig) -> Result<Self, FlipbookError> {
        info!("Opening flipbook source: {}", reference);
        let bytes = input::fetch_source(reference, config.fetch_timeout_secs).await?;
        let decoder = PdfiumDecoder::new(reference, bytes, config.password.clone());
        Self::with_decoder(reference, Arc::new(decoder), config).await
    }

    /// Open a session over an arbitrary [`PageDecoder`].
    pub async fn with_decoder(
        reference: &str,
        decoder: Arc<dyn PageDecoder>,
        config: &RenderConfig,
    ) -> Result<Self, FlipbookError> {
        let counter = Arc::clone(&decoder);
        let total_pages = tokio::task::spawn_blocking(move || counter.page_count())
            .await
            .map_err(|e| FlipbookError::Internal(format!("Open task panicked: {}", e)))??;

        if total_pages == 0 {
            return Err(FlipbookError::EmptyDocument {
                reference: reference.to_string(),
            });
        }

        let mut session = RenderSession::new(reference);
        session.set_total_pages(total_pages);

        if let Some(ref cb) = config.progress_callback {
            cb.on_open(total_pages);
        }

        Ok(Self {
            decoder,
            config: config.clone(),
            session,
            total_pages,
            next_index: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.total_pages
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    /// Mutable access for navigation (`next`, `prev`, `go_to`).
    pub fn session_mut(&mut self) -> &mut RenderSession {
        &mut self.session
    }

    pub fn into_session(self) -> RenderSession {
        self.session
    }

    pub fn is_done(&self) -> bool {
        self.next_index >= self.total_pages
    }

    /// Decode, encode and append the next page.
    pub async fn render_next(&mut self) -> RenderStep {
        if self.is_done() {
            if !self.session.is_finished() {
                self.session.mark_finished();
                let ok = self.session.produced_count();
                info!("Rendering complete: {}/{} pages", ok, self.total_pages);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_render_complete(self.total_pages, ok);
                }
            }
            return RenderStep::Done;
        }

        let index = self.next_index;
        self.next_index += 1;
        let page_num = index + 1;

        let decoder = Arc::clone(&self.decoder);
        let scale = self.config.scale;
        let quality = self.config.jpeg_quality;

        let result = tokio::task::spawn_blocking(move || {
            let image = decoder
                .decode_page(index, scale)
                .map_err(|detail| PageRenderError::DecodeFailed {
                    page: page_num,
                    detail,
                })?;
            encode::encode_page(index, &image, quality).map_err(|e| {
                PageRenderError::EncodeFailed {
                    page: page_num,
                    detail: e.to_string(),
                }
            })
        })
        .await
        .unwrap_or_else(|e| {
            Err(PageRenderError::TaskFailed {
                page: page_num,
                detail: e.to_string(),
            })
        });

        match result {
            Ok(raster) => {
                let raster = Arc::new(raster);
                let bytes = raster.data_url.len();
                let appended = self.session.push_raster(Arc::clone(&raster));
                debug_assert!(appended, "next_index only ever increases");
                debug!("Page {}/{} ready", page_num, self.total_pages);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_page_ready(page_num, self.total_pages, bytes);
                }
                RenderStep::Page(raster)
            }
            Err(err) => self.skip(err),
        }
    }

    fn skip(&mut self, err: PageRenderError) -> RenderStep {
        warn!("Skipping {}", err);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_page_error(err.page(), self.total_pages, &err.to_string());
        }
        self.session.record_failure(err.clone());
        RenderStep::Skipped(err)
    }

    /// Drive [`Renderer::render_next`] until [`RenderStep::Done`].
    pub async fn render_all(&mut self) {
        while !matches!(self.render_next().await, RenderStep::Done) {}
    }
}
