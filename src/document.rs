//! Document boundary: the two calls the pipeline needs from a PDF library.
//!
//! The pipeline never touches pdfium directly. It sees a [`DocumentBackend`]
//! that opens a byte buffer and lends out a [`Document`] for the duration of
//! one visit. Lending (rather than returning) the document keeps the pdfium
//! bindings, the parsed document and every page borrowed from it on a single
//! stack frame, which is what pdfium-render's lifetimes require.
//!
//! [`PdfiumBackend`] is the production implementation. Tests plug in an
//! in-memory backend.

use crate::error::{ExtractError, PipelineError, RenderError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An opened PDF, valid for one visit.
///
/// Page numbers are 1-based; callers guarantee `1 <= page <= page_count()`.
pub trait Document {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Rasterise `page` with its native box scaled by `scale`.
    ///
    /// Must return only fully drawn bitmaps.
    fn render(&self, page: usize, scale: f32) -> Result<DynamicImage, RenderError>;

    /// Every text fragment on `page`, in the order the content stream yields
    /// them.
    fn text_fragments(&self, page: usize) -> Result<Vec<String>, ExtractError>;
}

/// Opens PDF bytes and lends the parsed document to a visitor.
///
/// Implementations are shared across runs and moved onto blocking threads,
/// hence `Send + Sync`.
pub trait DocumentBackend: Send + Sync {
    /// Open `bytes` and call `visit` with the document.
    ///
    /// Returns [`PipelineError::OpenFailed`] when the bytes cannot be parsed;
    /// otherwise returns whatever `visit` returns.
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn Document) -> Result<(), PipelineError>,
    ) -> Result<(), PipelineError>;
}

/// [`DocumentBackend`] backed by the pdfium C++ library.
///
/// Bindings are created per visit, on whichever thread performs the visit.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumBackend {
    /// Bind to the system pdfium library on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium shared library at `path` instead of the system one.
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = Some(path.into());
        self
    }

    /// User password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn library(&self) -> Option<&Path> {
        self.library.as_deref()
    }

    fn bind(&self) -> Result<Pdfium, PipelineError> {
        let bindings = match &self.library {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| PipelineError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl DocumentBackend for PdfiumBackend {
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn Document) -> Result<(), PipelineError>,
    ) -> Result<(), PipelineError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| {
                let detail = format!("{:?}", e);
                if detail.contains("Password") || detail.contains("password") {
                    PipelineError::OpenFailed {
                        detail: if password.is_some() {
                            "wrong password".to_string()
                        } else {
                            "document is encrypted; provide --password".to_string()
                        },
                    }
                } else {
                    PipelineError::OpenFailed { detail }
                }
            })?;

        let document = PdfiumDocument { document };
        info!("PDF loaded: {} pages", document.page_count());

        visit(&document)
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl Document for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render(&self, page: usize, scale: f32) -> Result<DynamicImage, RenderError> {
        let pdf_page = self
            .document
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| RenderError {
                page,
                detail: format!("{:?}", e),
            })?;

        debug!(
            "Page {} box: {:.1}x{:.1} pt",
            page,
            pdf_page.width().value,
            pdf_page.height().value
        );

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = pdf_page
            .render_with_config(&render_config)
            .map_err(|e| RenderError {
                page,
                detail: format!("{:?}", e),
            })?;

        Ok(bitmap.as_image())
    }

    fn text_fragments(&self, page: usize) -> Result<Vec<String>, ExtractError> {
        let pdf_page = self
            .document
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| ExtractError {
                page,
                detail: format!("{:?}", e),
            })?;

        let objects = pdf_page.objects();
        let mut fragments = Vec::new();
        for index in 0..objects.len() {
            objects
                .get(index)
                .and_then(|object| collect_text(&object, &mut fragments))
                .map_err(|e| ExtractError {
                    page,
                    detail: format!("{:?}", e),
                })?;
        }

        Ok(fragments)
    }
}

/// Append the text of `object` to `out`, descending into form XObjects so
/// text drawn through a reusable form is read in content-stream order.
fn collect_text(object: &PdfPageObject<'_>, out: &mut Vec<String>) -> Result<(), PdfiumError> {
    if let Some(text) = object.as_text_object() {
        out.push(text.text());
    } else if let Some(form) = object.as_x_object_form_object() {
        for index in 0..form.len() {
            collect_text(&form.get(index)?, out)?;
        }
    }
    Ok(())
}
