//! Error types for the flipbook-render library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FlipbookError`] is **fatal**: the session cannot start at all (the
//!   reference cannot be fetched or parsed, the document has no pages,
//!   pdfium is missing). Returned as `Err(FlipbookError)` from `open` and
//!   the eager `render_*` entry points.
//!
//! * [`PageRenderError`] is **non-fatal**: one page failed to decode or encode
//!   but every other page is fine. The page is skipped, the error is recorded
//!   on the [`crate::session::RenderSession`], and rendering moves on to the
//!   next index.
//!
//! Neither kind is retried automatically. Re-opening the reference is the
//! caller's retry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the flipbook-render library.
#[derive(Debug, Error)]
pub enum FlipbookError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// The document reference could not be fetched or opened.
    #[error("Source '{reference}' is unavailable: {cause}")]
    SourceUnavailable {
        reference: String,
        cause: SourceFailure,
    },

    /// The document opened fine but contains zero pages.
    #[error("No pages found in '{reference}'")]
    EmptyDocument { reference: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library next to the\n\
binary, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a page image on disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlipbookError {
    pub(crate) fn source_unavailable(reference: impl Into<String>, cause: SourceFailure) -> Self {
        FlipbookError::SourceUnavailable {
            reference: reference.into(),
            cause,
        }
    }

    /// `true` for the "no pages found" outcome, which callers usually show
    /// as an empty state rather than as a failure with a retry button.
    pub fn is_empty_document(&self) -> bool {
        matches!(self, FlipbookError::EmptyDocument { .. })
    }
}

/// Why a document reference could not be turned into an open document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceFailure {
    #[error("file not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Neither a readable path nor a valid HTTP/HTTPS/file URL.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("download timed out after {0}s")]
    DownloadTimeout(u64),

    /// The bytes were fetched but do not start with `%PDF`.
    #[error("not a PDF (first bytes: {0:?})")]
    NotAPdf([u8; 4]),

    /// Header, trailer or xref could not be parsed.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[error("document is encrypted and requires a password")]
    PasswordRequired,

    #[error("wrong password")]
    WrongPassword,
}

/// A non-fatal error for a single page.
///
/// Page numbers are 1-based, matching what a reader sees.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PageRenderError {
    /// pdfium could not load or rasterise the page.
    #[error("Page {page}: decode failed: {detail}")]
    DecodeFailed { page: usize, detail: String },

    /// The bitmap could not be JPEG-encoded.
    #[error("Page {page}: encode failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The blocking decode task panicked or was cancelled by the runtime.
    #[error("Page {page}: render task failed: {detail}")]
    TaskFailed { page: usize, detail: String },
}

impl PageRenderError {
    /// The 1-based page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageRenderError::DecodeFailed { page, .. }
            | PageRenderError::EncodeFailed { page, .. }
            | PageRenderError::TaskFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_display() {
        let e = FlipbookError::source_unavailable(
            "https://cdn.example.com/issue-7.pdf",
            SourceFailure::DownloadFailed("HTTP 404 Not Found".into()),
        );
        let msg = e.to_string();
        assert!(msg.contains("issue-7.pdf"), "got: {msg}");
        assert!(msg.contains("HTTP 404"), "got: {msg}");
    }

    #[test]
    fn empty_document_is_flagged() {
        let e = FlipbookError::EmptyDocument {
            reference: "blank.pdf".into(),
        };
        assert!(e.is_empty_document());
        assert!(e.to_string().contains("No pages found"));

        let other = FlipbookError::Internal("boom".into());
        assert!(!other.is_empty_document());
    }

    #[test]
    fn not_a_pdf_shows_magic() {
        let e = SourceFailure::NotAPdf(*b"<htm");
        assert!(e.to_string().contains("not a PDF"));
    }

    #[test]
    fn page_error_reports_page() {
        let e = PageRenderError::DecodeFailed {
            page: 3,
            detail: "bad xobject".into(),
        };
        assert_eq!(e.page(), 3);
        assert!(e.to_string().starts_with("Page 3"));

        let e = PageRenderError::TaskFailed {
            page: 9,
            detail: "panicked".into(),
        };
        assert_eq!(e.page(), 9);
    }
}
