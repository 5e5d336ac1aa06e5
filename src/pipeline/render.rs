//! PDF rasterisation: decode one page at a time via pdfium.
//!
//! The renderer talks to a [`PageDecoder`] rather than to pdfium directly.
//! [`PdfiumDecoder`] is the real implementation; anything else that can
//! count pages and hand back a `DynamicImage` per page (a test double, a
//! different backend) plugs into the same render loop.
//!
//! ## Blocking
//!
//! pdfium is synchronous C++ code. Decoder methods are blocking and are
//! always called from `tokio::task::spawn_blocking` by the render loop.
//!
//! ## Engine lifetime
//!
//! `Pdfium::new` initialises the library process-wide and dropping the handle
//! tears it down again, so two sessions binding and dropping their own
//! handles would race. The engine is bound once into a process-wide
//! [`OnceLock`] and never dropped. A failed bind is not cached: the error is
//! returned and the next call tries again.
//!
//! Documents are not kept open between pages: each decode reopens the
//! in-memory bytes, which keeps `PdfDocument`'s borrow of the engine local
//! to one call.

use crate::error::{FlipbookError, SourceFailure};
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info};

/// Source of decoded pages for a render session.
pub trait PageDecoder: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> Result<usize, FlipbookError>;

    /// Rasterise page `index` (0-based) at `scale` × native size.
    ///
    /// The error string is wrapped into a
    /// [`crate::error::PageRenderError::DecodeFailed`] by the caller.
    fn decode_page(&self, index: usize, scale: f32) -> Result<DynamicImage, String>;
}

static PDFIUM: OnceLock<Pdfium> = OnceLock::new();
static BIND_LOCK: Mutex<()> = Mutex::new(());

/// The process-wide pdfium engine, bound on first use.
///
/// Resolution order: `PDFIUM_LIB_PATH`, a library in the working directory,
/// then the system library.
pub fn engine() -> Result<&'static Pdfium, FlipbookError> {
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }

    // Serialise binding so only one thread ever runs FPDF_InitLibrary.
    let _guard = BIND_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }

    let pdfium = Pdfium::new(bind_library()?);
    info!("pdfium engine bound");
    Ok(PDFIUM.get_or_init(|| pdfium))
}

fn bind_library() -> Result<Box<dyn PdfiumLibraryBindings>, FlipbookError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        if !path.is_empty() {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            return Pdfium::bind_to_library(&path)
                .map_err(|e| FlipbookError::PdfiumBindingFailed(format!("{path}: {e}")));
        }
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| FlipbookError::PdfiumBindingFailed(e.to_string()))
}

/// Map a pdfium load failure onto the source taxonomy.
fn classify_load_error(err: &PdfiumError, has_password: bool) -> SourceFailure {
    let err_str = format!("{:?}", err);
    if err_str.contains("Password") || err_str.contains("password") {
        if has_password {
            SourceFailure::WrongPassword
        } else {
            SourceFailure::PasswordRequired
        }
    } else {
        SourceFailure::Corrupt(err_str)
    }
}

/// [`PageDecoder`] backed by pdfium over an in-memory PDF.
#[derive(Clone)]
pub struct PdfiumDecoder {
    reference: String,
    bytes: Arc<Vec<u8>>,
    password: Option<String>,
}

impl PdfiumDecoder {
    pub fn new(reference: impl Into<String>, bytes: Vec<u8>, password: Option<String>) -> Self {
        Self {
            reference: reference.into(),
            bytes: Arc::new(bytes),
            password,
        }
    }

    fn load<'a>(&'a self, pdfium: &'a Pdfium) -> Result<PdfDocument<'a>, SourceFailure> {
        pdfium
            .load_pdf_from_byte_slice(&self.bytes, self.password.as_deref())
            .map_err(|e| classify_load_error(&e, self.password.is_some()))
    }

    /// Read document metadata without rendering any page.
    pub fn metadata(&self) -> Result<DocumentMetadata, FlipbookError> {
        let pdfium = engine()?;
        let document = self
            .load(pdfium)
            .map_err(|cause| FlipbookError::source_unavailable(&self.reference, cause))?;

        let metadata = document.metadata();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().trim().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        Ok(DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: document.pages().len() as usize,
            pdf_version: format!("{:?}", document.version()),
        })
    }
}

impl PageDecoder for PdfiumDecoder {
    fn page_count(&self) -> Result<usize, FlipbookError> {
        let pdfium = engine()?;
        let document = self
            .load(pdfium)
            .map_err(|cause| FlipbookError::source_unavailable(&self.reference, cause))?;
        let count = document.pages().len() as usize;
        info!("PDF loaded: {} pages", count);
        Ok(count)
    }

    fn decode_page(&self, index: usize, scale: f32) -> Result<DynamicImage, String> {
        let pdfium = engine().map_err(|e| e.to_string())?;
        let document = self.load(pdfium).map_err(|e| e.to_string())?;

        let page_index =
            u16::try_from(index).map_err(|_| format!("page index {index} exceeds pdfium range"))?;
        let page = document
            .pages()
            .get(page_index)
            .map_err(|e| format!("{:?}", e))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| format!("{:?}", e))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Extract document metadata off the async executor.
pub async fn extract_metadata(decoder: PdfiumDecoder) -> Result<DocumentMetadata, FlipbookError> {
    tokio::task::spawn_blocking(move || decoder.metadata())
        .await
        .map_err(|e| FlipbookError::Internal(format!("Metadata task panicked: {}", e)))?
}
