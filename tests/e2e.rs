//! End-to-end integration tests for flipbook-render.
//!
//! These tests use real PDF files in `./test_cases/` and a real pdfium
//! library. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_inspect -- --nocapture

use flipbook_render::{
    inspect, open_stream, render_document, render_from_bytes, render_to_dir, FlipbookError,
    FlipbookViewer, RenderConfig, SourceFailure,
};
use futures::StreamExt;
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn sample_pdf() -> PathBuf {
    test_cases_dir().join("sample.pdf")
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_sample() {
    let path = e2e_skip_unless_ready!(sample_pdf());

    let meta = inspect(path.to_str().unwrap(), &RenderConfig::default())
        .await
        .expect("inspect() should succeed");

    assert!(meta.page_count > 0);
    assert!(!meta.pdf_version.is_empty());
    println!("Metadata: {:?}", meta);
}

// ── Eager rendering ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_render_document_sample() {
    let path = e2e_skip_unless_ready!(sample_pdf());

    let output = render_document(path.to_str().unwrap(), &RenderConfig::default())
        .await
        .expect("render_document() should succeed");

    assert_eq!(output.stats.total_pages, output.pages.len() + output.failures.len());
    assert!(output.failures.is_empty(), "failures: {:?}", output.failures);
    for w in output.pages.windows(2) {
        assert!(w[0].index < w[1].index);
    }
    for page in &output.pages {
        assert!(page.data_url.starts_with("data:image/jpeg;base64,"));
        let jpeg = page.jpeg_bytes().unwrap();
        let img = image::load_from_memory(&jpeg).expect("valid jpeg");
        assert_eq!((img.width(), img.height()), (page.width, page.height));
    }
    println!(
        "[render] {} pages, {} bytes, {}ms",
        output.pages.len(),
        output.stats.total_bytes,
        output.stats.total_duration_ms
    );
}

#[tokio::test]
async fn test_scale_changes_raster_size() {
    let path = e2e_skip_unless_ready!(sample_pdf());
    let reference = path.to_str().unwrap();

    let small = RenderConfig::builder().scale(1.0).build().unwrap();
    let large = RenderConfig::builder().scale(2.0).build().unwrap();

    let a = render_document(reference, &small).await.unwrap();
    let b = render_document(reference, &large).await.unwrap();
    let (pa, pb) = (&a.pages[0], &b.pages[0]);
    assert!(pb.width > pa.width);
    // Within a pixel of exactly twice the size.
    assert!((pb.width as i64 - 2 * pa.width as i64).abs() <= 2);
}

#[tokio::test]
async fn test_render_to_dir_writes_numbered_jpegs() {
    let path = e2e_skip_unless_ready!(sample_pdf());
    let dir = tempfile::tempdir().unwrap();

    let output = render_to_dir(path.to_str().unwrap(), dir.path(), &RenderConfig::default())
        .await
        .expect("render_to_dir() should succeed");

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), output.stats.rendered_pages);
    assert_eq!(names.len(), output.files.len());
    assert!(output.failures.is_empty(), "failures: {:?}", output.failures);
    assert_eq!(names[0], "page-0001.jpg");
}

#[tokio::test]
async fn test_render_from_bytes() {
    let path = e2e_skip_unless_ready!(sample_pdf());
    let bytes = std::fs::read(&path).unwrap();

    let output = render_from_bytes(bytes, &RenderConfig::default())
        .await
        .expect("render_from_bytes() should succeed");
    assert!(!output.pages.is_empty());
    assert_eq!(output.stats.fetch_duration_ms, 0);
}

// ── Progressive rendering ────────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_sample() {
    let path = e2e_skip_unless_ready!(sample_pdf());

    let (total, stream) = open_stream(path.to_str().unwrap(), &RenderConfig::default())
        .await
        .expect("open_stream() should succeed");
    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), total);
}

#[tokio::test]
async fn test_viewer_sample() {
    let path = e2e_skip_unless_ready!(sample_pdf());

    let mut viewer = FlipbookViewer::open(path.to_str().unwrap(), &RenderConfig::default())
        .await
        .expect("viewer should open");
    let total = viewer.page_count();
    while viewer.changed().await {}

    assert!(viewer.is_finished());
    assert_eq!(
        viewer.session().produced_count() + viewer.session().failures().len(),
        total
    );
    let session = viewer.close().await;
    assert_eq!(session.progress().current, 1);
}

// ── Source failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_truncated_pdf_is_source_unavailable() {
    let path = e2e_skip_unless_ready!(sample_pdf());
    let bytes = std::fs::read(&path).unwrap();
    let truncated = bytes[..bytes.len().min(64)].to_vec();

    let err = render_from_bytes(truncated, &RenderConfig::default())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            FlipbookError::SourceUnavailable {
                cause: SourceFailure::Corrupt(_),
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_unreachable_url_is_source_unavailable() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let config = RenderConfig::builder().fetch_timeout_secs(5).build().unwrap();
    let err = render_document("http://127.0.0.1:9/missing.pdf", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, FlipbookError::SourceUnavailable { .. }));
}
