//! Input resolution: turn a document reference into the source PDF bytes.
//!
//! A reference is an HTTP(S) URL, a `file://` URL, or a plain local path.
//! The bytes are kept in memory for the whole session; pdfium reopens them
//! for every page, so nothing is written to disk. The `%PDF` magic is
//! checked here so a wrong URL (an HTML error page, say) surfaces as
//! `SourceUnavailable` instead of an obscure pdfium parse failure.

use crate::error::{FlipbookError, SourceFailure};
use futures::StreamExt;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on how much of an advertised `Content-Length` is reserved up
/// front. The header is untrusted; larger bodies still grow the buffer.
const MAX_PREALLOC_BYTES: u64 = 64 * 1024 * 1024;

/// How a reference will be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    Remote(Url),
    Local(PathBuf),
}

/// Check if the input string looks like an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn is_file_url(input: &str) -> bool {
    input.to_ascii_lowercase().starts_with("file://")
}

/// Classify a reference without touching the network or the file system.
pub fn classify_reference(reference: &str) -> Result<ReferenceKind, SourceFailure> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(SourceFailure::InvalidReference("empty reference".into()));
    }

    if is_url(trimmed) {
        let url = Url::parse(trimmed).map_err(|e| SourceFailure::InvalidReference(e.to_string()))?;
        if url.host_str().is_none() {
            return Err(SourceFailure::InvalidReference("URL has no host".into()));
        }
        if !looks_like_pdf(&url) {
            warn!("Reference does not look like a PDF: {}", url);
        }
        return Ok(ReferenceKind::Remote(url));
    }

    if is_file_url(trimmed) {
        let url = Url::parse(trimmed).map_err(|e| SourceFailure::InvalidReference(e.to_string()))?;
        let path = url
            .to_file_path()
            .map_err(|_| SourceFailure::InvalidReference(format!("not a local file URL: {trimmed}")))?;
        return Ok(ReferenceKind::Local(path));
    }

    Ok(ReferenceKind::Local(PathBuf::from(trimmed)))
}

/// Blob-store URLs often percent-encode the object path and append query
/// parameters, so this only checks that `.pdf` appears somewhere in the path.
fn looks_like_pdf(url: &Url) -> bool {
    url.path().to_ascii_lowercase().contains(".pdf")
}

/// Fetch the source bytes for `reference`.
///
/// Every failure is reported as [`FlipbookError::SourceUnavailable`].
pub async fn fetch_source(reference: &str, timeout_secs: u64) -> Result<Vec<u8>, FlipbookError> {
    let kind = classify_reference(reference)
        .map_err(|cause| FlipbookError::source_unavailable(reference, cause))?;

    let bytes = match kind {
        ReferenceKind::Remote(url) => download(&url, timeout_secs).await,
        ReferenceKind::Local(path) => read_local(&path).await,
    }
    .map_err(|cause| FlipbookError::source_unavailable(reference, cause))?;

    check_magic(&bytes).map_err(|cause| FlipbookError::source_unavailable(reference, cause))?;
    Ok(bytes)
}

/// Verify the `%PDF` header.
pub fn check_magic(bytes: &[u8]) -> Result<(), SourceFailure> {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    if &magic == b"%PDF" {
        Ok(())
    } else {
        Err(SourceFailure::NotAPdf(magic))
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, SourceFailure> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SourceFailure::NotFound,
        std::io::ErrorKind::PermissionDenied => SourceFailure::PermissionDenied,
        _ => SourceFailure::ReadFailed(e.to_string()),
    })?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

async fn download(url: &Url, timeout_secs: u64) -> Result<Vec<u8>, SourceFailure> {
    info!("Downloading PDF from: {}", url);

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            SourceFailure::DownloadTimeout(timeout_secs)
        } else {
            SourceFailure::DownloadFailed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SourceFailure::DownloadFailed(e.to_string()))?;

    let response = client.get(url.clone()).send().await.map_err(map_err)?;

    if !response.status().is_success() {
        return Err(SourceFailure::DownloadFailed(format!(
            "HTTP {}",
            response.status()
        )));
    }

    let hint = response.content_length().unwrap_or(0).min(MAX_PREALLOC_BYTES);
    let mut buf = Vec::with_capacity(hint as usize);
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk.map_err(map_err)?);
    }

    info!("Downloaded {} bytes from {}", buf.len(), url);
    Ok(buf)
}
