//! Per-PDF orchestration: classify → render → hash → save → split.
//!
//! [`PdfProcessor`] is the seam front ends and the batch runner depend on.
//! [`FlashcardProcessor`] is the implementation, generic over the
//! [`DocumentLoader`] so tests can run without pdfium.
//!
//! Each flashcard page's full render is written to the temp directory as
//! `{base}_page{n}_{hash8}.png` and split from there into the output
//! directory. [`PdfProcessor::cleanup`] removes those renders again, and the
//! temp directory itself only if this processor created it and nothing else
//! was put there.

use crate::cancel::CancellationToken;
use crate::config::ProcessorConfig;
use crate::error::{PageError, Pdf2AnkiError, SplitError};
use crate::logging::Logger;
use crate::output::{ImagePair, ProcessingStats};
use crate::pipeline::classify::{ClassifiablePage, Classifier};
use crate::pipeline::hash::hash_image;
use crate::pipeline::input::{file_stem, validate_pdf};
use crate::pipeline::render::{DocumentLoader, PageHandle, PdfiumLoader};
use crate::pipeline::split::Splitter;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace, warn};

/// Turns one PDF into flashcard image pairs.
pub trait PdfProcessor {
    /// Process every page of `pdf_path`.
    ///
    /// Per-page failures are recorded in [`ProcessingStats::page_errors`].
    /// Returns [`Pdf2AnkiError::Cancelled`] as soon as `cancel` is observed
    /// (checked once per page); files written so far are left in place.
    fn process_pdf(
        &self,
        pdf_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ProcessingStats, Pdf2AnkiError>;

    /// Release temporary resources.
    fn cleanup(&self) -> Result<(), Pdf2AnkiError>;

    /// Directory the processor writes throwaway files into, if any.
    fn scratch_dir(&self) -> Option<&Path> {
        None
    }
}

/// Files this processor put in the temp directory.
#[derive(Debug, Default)]
struct Scratch {
    created_dir: bool,
    renders: Vec<PathBuf>,
}

pub struct FlashcardProcessor<L: DocumentLoader = PdfiumLoader> {
    config: ProcessorConfig,
    loader: L,
    classifier: Classifier,
    splitter: Splitter,
    scratch: Mutex<Scratch>,
    logger: Logger,
}

impl FlashcardProcessor<PdfiumLoader> {
    /// Processor backed by pdfium. Fails if no pdfium library can be bound.
    pub fn new(config: ProcessorConfig, logger: Logger) -> Result<Self, Pdf2AnkiError> {
        let loader = PdfiumLoader::new(&config)?;
        Self::with_loader(config, loader, logger)
    }
}

impl<L: DocumentLoader> FlashcardProcessor<L> {
    /// Creates the output directory.
    pub fn with_loader(
        config: ProcessorConfig,
        loader: L,
        logger: Logger,
    ) -> Result<Self, Pdf2AnkiError> {
        let splitter = Splitter::new(&config.output_dir, logger.clone()).map_err(|e| match e {
            SplitError::OutputDir { path, source } => Pdf2AnkiError::DirectoryFailed { path, source },
            other => Pdf2AnkiError::Internal(other.to_string()),
        })?;

        Ok(Self {
            classifier: Classifier::new(config.options, config.dimensions),
            config,
            loader,
            splitter,
            scratch: Mutex::default(),
            logger,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn scratch(&self) -> MutexGuard<'_, Scratch> {
        self.scratch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn extract(&self, page: &PageHandle<'_>, base: &str) -> Result<ImagePair, PageError> {
        let page_number = page.page_number();
        let img = page.render()?;
        let hash = hash_image(&img);
        trace!("Page {page_number} hash: {hash}");

        let page_path = self
            .config
            .temp_dir
            .join(format!("{base}_page{page_number}_{}.png", hash.short()));
        img.save_with_format(&page_path, ImageFormat::Png)
            .map_err(|e| PageError::SaveFailed {
                page: page_number,
                detail: format!("{}: {e}", page_path.display()),
            })?;
        self.scratch().renders.push(page_path.clone());

        self.splitter
            .split_file(&page_path, base, &hash)
            .map_err(|e| PageError::SplitFailed {
                page: page_number,
                detail: e.to_string(),
            })
    }
}

impl<L: DocumentLoader> PdfProcessor for FlashcardProcessor<L> {
    fn process_pdf(
        &self,
        pdf_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ProcessingStats, Pdf2AnkiError> {
        self.logger.in_scope(|| {
            info!("Processing PDF: {}", pdf_path.display());
            validate_pdf(pdf_path)?;

            let temp_dir = &self.config.temp_dir;
            if !temp_dir.is_dir() {
                std::fs::create_dir_all(temp_dir).map_err(|e| Pdf2AnkiError::DirectoryFailed {
                    path: temp_dir.clone(),
                    source: e,
                })?;
                self.scratch().created_dir = true;
            }

            let document = self.loader.open(pdf_path)?;
            let base = file_stem(pdf_path);
            let mut stats = ProcessingStats::new(pdf_path);
            let total_pages = document.page_count();

            for index in 0..total_pages {
                if cancel.is_cancelled() {
                    info!("Processing cancelled at page {} of {}", index + 1, total_pages);
                    return Err(Pdf2AnkiError::Cancelled);
                }
                stats.pages_scanned += 1;

                let page = PageHandle::new(&*document, index);
                match self.classifier.should_process(&page) {
                    Ok(true) => debug!("Page {} is a flashcard", page.page_number()),
                    Ok(false) => continue,
                    Err(e) => {
                        warn!("{e}");
                        stats.page_errors.push(e);
                        continue;
                    }
                }

                match self.extract(&page, &base) {
                    Ok(pair) => stats.push_pair(pair, page.page_number()),
                    Err(e) => {
                        warn!("{e}");
                        stats.page_errors.push(e);
                    }
                }
            }

            info!(
                "Found {} flashcards in {} pages of {}",
                stats.flashcard_count,
                total_pages,
                pdf_path.display()
            );
            Ok(stats)
        })
    }

    fn cleanup(&self) -> Result<(), Pdf2AnkiError> {
        self.logger.in_scope(|| {
            let mut scratch = self.scratch();
            debug!("Removing {} page renders", scratch.renders.len());
            while let Some(render) = scratch.renders.pop() {
                match std::fs::remove_file(&render) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        scratch.renders.push(render.clone());
                        return Err(Pdf2AnkiError::DirectoryFailed {
                            path: render,
                            source: e,
                        });
                    }
                }
            }

            let temp_dir = &self.config.temp_dir;
            if !scratch.created_dir || !temp_dir.is_dir() {
                scratch.created_dir = false;
                return Ok(());
            }
            let is_empty = std::fs::read_dir(temp_dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !is_empty {
                debug!("Keeping {}: it holds files pdf2anki did not write", temp_dir.display());
                return Ok(());
            }
            debug!("Removing temp directory {}", temp_dir.display());
            std::fs::remove_dir(temp_dir).map_err(|e| Pdf2AnkiError::DirectoryFailed {
                path: temp_dir.clone(),
                source: e,
            })?;
            scratch.created_dir = false;
            Ok(())
        })
    }

    fn scratch_dir(&self) -> Option<&Path> {
        Some(&self.config.temp_dir)
    }
}
