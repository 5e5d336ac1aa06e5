//! Eager (whole-document) entry points.
//!
//! ## Why eager vs. streaming?
//!
//! These functions drive a [`Renderer`] to completion before returning.
//! They suit batch jobs and the CLI. A reader-facing surface should use
//! [`crate::viewer::FlipbookViewer`] or [`crate::stream::render_stream`]
//! instead, so the first page shows up while the rest are still decoding.

use crate::config::RenderConfig;
use crate::error::FlipbookError;
use crate::output::{DirOutput, DocumentMetadata, PageRaster, RenderOutput, RenderStats};
use crate::pipeline::input;
use crate::pipeline::render::{self, PageDecoder, PdfiumDecoder};
use crate::renderer::{RenderStep, Renderer};
use crate::session::RenderSession;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Label used for documents handed over as raw bytes.
const IN_MEMORY_REFERENCE: &str = "<memory>";

/// Render every page of a PDF file or URL.
///
/// # Returns
/// `Ok(RenderOutput)` once every page has been attempted, even if some
/// pages were skipped (see `output.failures`).
///
/// # Errors
/// Only fatal errors: the source is unavailable or has no pages.
pub async fn render_document(
    reference: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<RenderOutput, FlipbookError> {
    let total_start = Instant::now();
    let reference = reference.as_ref();
    info!("Starting eager render: {}", reference);

    // ── Step 1: Fetch and open ───────────────────────────────────────────
    let (renderer, fetch_duration_ms) = open_timed(reference, config).await?;

    // ── Step 2: Render every page and assemble ───────────────────────────
    Ok(collect_pages(renderer, fetch_duration_ms, total_start).await)
}

/// Render every page served by `decoder`.
///
/// Same as [`render_document`] but skips the fetch step; `reference` is only
/// used to label errors and log lines.
pub async fn render_document_with_decoder(
    reference: impl AsRef<str>,
    decoder: Arc<dyn PageDecoder>,
    config: &RenderConfig,
) -> Result<RenderOutput, FlipbookError> {
    let total_start = Instant::now();
    let renderer = Renderer::with_decoder(reference.as_ref(), decoder, config).await?;
    Ok(collect_pages(renderer, 0, total_start).await)
}

/// Render PDF bytes already held in memory.
///
/// Skips the fetch step entirely; the bytes still have to start with `%PDF`.
pub async fn render_from_bytes(
    bytes: Vec<u8>,
    config: &RenderConfig,
) -> Result<RenderOutput, FlipbookError> {
    input::check_magic(&bytes)
        .map_err(|cause| FlipbookError::source_unavailable(IN_MEMORY_REFERENCE, cause))?;

    let decoder = PdfiumDecoder::new(IN_MEMORY_REFERENCE, bytes, config.password.clone());
    render_document_with_decoder(IN_MEMORY_REFERENCE, Arc::new(decoder), config).await
}

/// Render a document and write each page to `dir` as `page-0001.jpg`, …
///
/// Pages are written as soon as they are produced. Each write goes to a
/// temporary file in `dir` that is then renamed into place, so a reader of
/// the directory never sees a half-written image. Skipped pages get no file
/// and are listed in `output.failures`.
pub async fn render_to_dir(
    reference: impl AsRef<str>,
    dir: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<DirOutput, FlipbookError> {
    let total_start = Instant::now();
    let dir = dir.as_ref();
    create_output_dir(dir).await?;

    let (renderer, fetch_duration_ms) = open_timed(reference.as_ref(), config).await?;
    write_pages(renderer, dir, fetch_duration_ms, total_start).await
}

/// [`render_to_dir`] over an already-built decoder.
pub async fn render_to_dir_with_decoder(
    reference: impl AsRef<str>,
    decoder: Arc<dyn PageDecoder>,
    dir: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<DirOutput, FlipbookError> {
    let total_start = Instant::now();
    let dir = dir.as_ref();
    create_output_dir(dir).await?;

    let renderer = Renderer::with_decoder(reference.as_ref(), decoder, config).await?;
    write_pages(renderer, dir, 0, total_start).await
}

/// Synchronous wrapper around [`render_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn render_sync(
    reference: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<RenderOutput, FlipbookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FlipbookError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(render_document(reference, config))
}

/// Read document metadata without rendering any page.
///
/// Only `fetch_timeout_secs` and `password` are taken from `config`.
pub async fn inspect(
    reference: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<DocumentMetadata, FlipbookError> {
    let reference = reference.as_ref();
    let bytes = input::fetch_source(reference, config.fetch_timeout_secs).await?;
    let decoder = PdfiumDecoder::new(reference, bytes, config.password.clone());
    render::extract_metadata(decoder).await
}

/// File name used for page `index` (0-based) by [`render_to_dir`].
pub fn page_file_name(index: usize) -> String {
    format!("page-{:04}.jpg", index + 1)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn open_timed(
    reference: &str,
    config: &RenderConfig,
) -> Result<(Renderer, u64), FlipbookError> {
    let fetch_start = Instant::now();
    let bytes = input::fetch_source(reference, config.fetch_timeout_secs).await?;
    let fetch_duration_ms = elapsed_ms(fetch_start);
    debug!("Fetched {} bytes in {}ms", bytes.len(), fetch_duration_ms);

    let decoder = PdfiumDecoder::new(reference, bytes, config.password.clone());
    let renderer = Renderer::with_decoder(reference, Arc::new(decoder), config).await?;
    Ok((renderer, fetch_duration_ms))
}

async fn collect_pages(
    mut renderer: Renderer,
    fetch_duration_ms: u64,
    total_start: Instant,
) -> RenderOutput {
    let render_start = Instant::now();
    renderer.render_all().await;
    let render_duration_ms = elapsed_ms(render_start);

    let session = renderer.into_session();
    let stats = compute_stats(&session, fetch_duration_ms, render_duration_ms, total_start);
    info!(
        "Render complete: {}/{} pages, {}ms total",
        stats.rendered_pages, stats.total_pages, stats.total_duration_ms
    );
    RenderOutput::from_rasters(session.rasters(), session.failures().to_vec(), stats)
}

async fn create_output_dir(dir: &Path) -> Result<(), FlipbookError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| FlipbookError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

async fn write_pages(
    mut renderer: Renderer,
    dir: &Path,
    fetch_duration_ms: u64,
    total_start: Instant,
) -> Result<DirOutput, FlipbookError> {
    let render_start = Instant::now();
    let mut files = Vec::new();
    loop {
        match renderer.render_next().await {
            RenderStep::Page(raster) => files.push(write_page(dir, raster).await?),
            RenderStep::Skipped(_) => {}
            RenderStep::Done => break,
        }
    }
    let render_duration_ms = elapsed_ms(render_start);

    let session = renderer.session();
    let stats = compute_stats(session, fetch_duration_ms, render_duration_ms, total_start);
    info!("Wrote {} page images to {}", files.len(), dir.display());
    Ok(DirOutput {
        files,
        failures: session.failures().to_vec(),
        stats,
    })
}

/// Atomically write one raster's JPEG bytes into `dir`.
async fn write_page(dir: &Path, raster: Arc<PageRaster>) -> Result<PathBuf, FlipbookError> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || write_page_blocking(&dir, &raster))
        .await
        .map_err(|e| FlipbookError::Internal(format!("Write task panicked: {}", e)))?
}

fn write_page_blocking(dir: &Path, raster: &PageRaster) -> Result<PathBuf, FlipbookError> {
    let path = dir.join(page_file_name(raster.index));
    let jpeg = raster.jpeg_bytes().map_err(|e| {
        FlipbookError::Internal(format!(
            "Page {} carries an invalid data URL: {}",
            raster.page_num(),
            e
        ))
    })?;

    let write_failed = |source: std::io::Error| FlipbookError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(&jpeg).map_err(write_failed)?;
    tmp.persist(&path).map_err(|e| write_failed(e.error))?;

    debug!("Wrote {} ({} bytes)", path.display(), jpeg.len());
    Ok(path)
}

fn compute_stats(
    session: &RenderSession,
    fetch_duration_ms: u64,
    render_duration_ms: u64,
    total_start: Instant,
) -> RenderStats {
    RenderStats {
        total_pages: session.total_pages().unwrap_or(0),
        rendered_pages: session.produced_count(),
        skipped_pages: session.failures().len(),
        total_bytes: session.rasters().iter().map(|r| r.data_url.len()).sum(),
        fetch_duration_ms,
        render_duration_ms,
        total_duration_ms: elapsed_ms(total_start),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_page;
    use image::{DynamicImage, Rgb, RgbImage};

    fn raster(index: usize) -> PageRaster {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 9, Rgb([10, 20, 30])));
        encode_page(index, &img, 90).unwrap()
    }

    #[test]
    fn page_file_names_are_one_based_and_padded() {
        assert_eq!(page_file_name(0), "page-0001.jpg");
        assert_eq!(page_file_name(41), "page-0042.jpg");
        assert_eq!(page_file_name(12344), "page-12345.jpg");
    }

    #[test]
    fn write_page_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_page_blocking(dir.path(), &raster(2)).unwrap();

        assert_eq!(path, dir.path().join("page-0003.jpg"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary file must be renamed away");
    }

    #[test]
    fn write_page_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = write_page_blocking(&missing, &raster(0)).unwrap_err();
        assert!(matches!(err, FlipbookError::OutputWriteFailed { .. }));
    }

    #[tokio::test]
    async fn render_from_bytes_rejects_non_pdf() {
        let err = render_from_bytes(b"GIF89a...".to_vec(), &RenderConfig::default())
            .await
            .unwrap_err();
        match err {
            FlipbookError::SourceUnavailable { reference, cause } => {
                assert_eq!(reference, "<memory>");
                assert_eq!(cause, crate::error::SourceFailure::NotAPdf(*b"GIF8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn render_sync_runs_without_an_outer_runtime() {
        let err = render_sync("/definitely/not/here.pdf", &RenderConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            FlipbookError::SourceUnavailable {
                cause: crate::error::SourceFailure::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_file_is_source_unavailable() {
        let err = render_document("/definitely/not/here.pdf", &RenderConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FlipbookError::SourceUnavailable { .. }));
    }
}
