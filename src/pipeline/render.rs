//! PDF access: page bounds, page text and page rasters.
//!
//! The processor only talks to the [`PageSource`] and [`DocumentLoader`]
//! traits. [`PdfiumLoader`] is the production implementation; tests plug in
//! an in-memory source.
//!
//! ## Why cap pixels as well as DPI?
//!
//! Flashcard pages are small, but nothing stops a user from pointing the tool
//! at a folder of posters. `max_rendered_pixels` bounds the longest edge
//! regardless of physical size, keeping memory bounded.

use crate::config::{PageDimensions, ProcessorConfig};
use crate::error::{PageError, Pdf2AnkiError};
use crate::pipeline::classify::ClassifiablePage;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Failure reported by a rendering backend for a single page.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// One opened document.
///
/// Indices are 0-based. Calls may be made in any order and more than once.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Page size in points.
    fn page_bounds(&self, index: usize) -> Result<PageDimensions, BackendError>;

    fn page_text(&self, index: usize) -> Result<String, BackendError>;

    fn render_page(&self, index: usize) -> Result<DynamicImage, BackendError>;
}

/// Opens documents as [`PageSource`]s.
pub trait DocumentLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, Pdf2AnkiError>;
}

/// A single page of an open [`PageSource`].
#[derive(Clone, Copy)]
pub struct PageHandle<'a> {
    source: &'a dyn PageSource,
    index: usize,
}

impl<'a> PageHandle<'a> {
    pub fn new(source: &'a dyn PageSource, index: usize) -> Self {
        Self { source, index }
    }

    pub fn render(&self) -> Result<DynamicImage, PageError> {
        self.source
            .render_page(self.index)
            .map_err(|e| PageError::RenderFailed {
                page: self.page_number(),
                detail: e.0,
            })
    }
}

impl ClassifiablePage for PageHandle<'_> {
    fn page_number(&self) -> usize {
        self.index + 1
    }

    fn bounds(&self) -> Result<PageDimensions, PageError> {
        self.source
            .page_bounds(self.index)
            .map_err(|e| PageError::BoundsUnavailable {
                page: self.page_number(),
                detail: e.0,
            })
    }

    fn text(&self) -> Result<String, PageError> {
        self.source
            .page_text(self.index)
            .map_err(|e| PageError::TextUnavailable {
                page: self.page_number(),
                detail: e.0,
            })
    }
}

/// Bind to a pdfium shared library.
///
/// Order: `PDFIUM_LIB_PATH`, the working directory, then the system library
/// search path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2AnkiError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(path);
        return Pdfium::bind_to_library(&path)
            .map(Pdfium::new)
            .map_err(|e| {
                Pdf2AnkiError::PdfiumBindingFailed(format!(
                    "{e:?} (PDFIUM_LIB_PATH={})",
                    path.display()
                ))
            });
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Pdf2AnkiError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// pdfium-backed [`DocumentLoader`].
pub struct PdfiumLoader {
    pdfium: Pdfium,
    dpi: u32,
    max_pixels: u32,
    password: Option<String>,
}

impl PdfiumLoader {
    /// Bind pdfium and take render settings from `config`.
    pub fn new(config: &ProcessorConfig) -> Result<Self, Pdf2AnkiError> {
        Ok(Self::with_pdfium(bind_pdfium()?, config))
    }

    pub fn with_pdfium(pdfium: Pdfium, config: &ProcessorConfig) -> Self {
        Self {
            pdfium,
            dpi: config.dpi,
            max_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
        }
    }

    fn render_config(&self) -> PdfRenderConfig {
        PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32)
    }
}

impl DocumentLoader for PdfiumLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, Pdf2AnkiError> {
        let password = self.password.as_deref();
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| {
                let err_str = format!("{e:?}");
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        Pdf2AnkiError::WrongPassword {
                            path: path.to_path_buf(),
                        }
                    } else {
                        Pdf2AnkiError::PasswordRequired {
                            path: path.to_path_buf(),
                        }
                    }
                } else {
                    Pdf2AnkiError::CorruptPdf {
                        path: path.to_path_buf(),
                        detail: err_str,
                    }
                }
            })?;

        info!("PDF loaded: {} pages", document.pages().len());

        Ok(Box::new(PdfiumDocument {
            document,
            render_config: self.render_config(),
        }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    render_config: PdfRenderConfig,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, BackendError> {
        let idx = u16::try_from(index)
            .map_err(|_| BackendError(format!("page index {index} out of range")))?;
        self.document
            .pages()
            .get(idx)
            .map_err(|e| BackendError(format!("{e:?}")))
    }
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_bounds(&self, index: usize) -> Result<PageDimensions, BackendError> {
        let page = self.page(index)?;
        Ok(PageDimensions::new(
            f64::from(page.width().value),
            f64::from(page.height().value),
        ))
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        let page = self.page(index)?;
        let text = page.text().map_err(|e| BackendError(format!("{e:?}")))?;
        Ok(text.all())
    }

    fn render_page(&self, index: usize) -> Result<DynamicImage, BackendError> {
        let page = self.page(index)?;
        let bitmap = page
            .render_with_config(&self.render_config)
            .map_err(|e| BackendError(format!("{e:?}")))?;

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
