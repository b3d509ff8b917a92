//! Batch entry point: one run over a source directory.
//!
//! ```text
//! check connection ──▶ find PDFs ──▶ for each PDF:
//!                                      process ──▶ create deck ──▶ sync pairs
//!                                  ──▶ finish report
//! ```
//!
//! Only a few conditions end a run early: a temp directory that holds the
//! source directory, an unreachable flashcard application (both checked
//! once, before any PDF is touched) and cancellation. Everything else is
//! logged, counted and skipped.

use crate::cancel::CancellationToken;
use crate::config::is_same_or_inside;
use crate::error::Pdf2AnkiError;
use crate::logging::Logger;
use crate::output::ProcessingReport;
use crate::pipeline::input::{find_pdfs, PdfFile};
use crate::processor::PdfProcessor;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::sync::deck::deck_name_from_path;
use crate::sync::{HttpTransport, SyncService, Transport};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Drives a [`PdfProcessor`] and an optional [`SyncService`] over a directory.
///
/// Without a sync service the run is a dry run: flashcards are extracted and
/// split, nothing is uploaded and no connection check is made.
pub struct BatchRunner<'a, P: PdfProcessor + ?Sized, T: Transport = HttpTransport> {
    processor: &'a P,
    sync: Option<&'a SyncService<T>>,
    root_deck: Option<String>,
    progress: ProgressCallback,
    logger: Logger,
}

impl<'a, P: PdfProcessor + ?Sized> BatchRunner<'a, P, HttpTransport> {
    /// Extract only; never contacts the flashcard application.
    pub fn dry_run(processor: &'a P) -> Self {
        Self::build(processor, None)
    }
}

impl<'a, P: PdfProcessor + ?Sized, T: Transport> BatchRunner<'a, P, T> {
    pub fn new(processor: &'a P, sync: &'a SyncService<T>) -> Self {
        Self::build(processor, Some(sync))
    }

    fn build(processor: &'a P, sync: Option<&'a SyncService<T>>) -> Self {
        Self {
            processor,
            sync,
            root_deck: None,
            progress: Arc::new(NoopProgressCallback),
            logger: Logger::inherit(),
        }
    }

    /// Prefix for every deck name, e.g. `School` → `School::biology::cells`.
    pub fn root_deck(mut self, prefix: Option<String>) -> Self {
        self.root_deck = prefix;
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = callback;
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.sync.is_none()
    }

    /// Process and sync every PDF under `source_dir` into `report`.
    ///
    /// `report` is finished (end time stamped) on every return path, so a
    /// cancelled or aborted run still leaves an accurate partial report.
    ///
    /// # Errors
    /// - [`Pdf2AnkiError::InvalidConfig`] when the processor's scratch
    ///   directory is `source_dir` or one of its ancestors
    /// - [`Pdf2AnkiError::ConnectionFailed`] before any PDF is processed
    /// - [`Pdf2AnkiError::NoPdfsFound`] / scan failures
    /// - [`Pdf2AnkiError::Cancelled`]
    pub fn run(
        &self,
        source_dir: &Path,
        cancel: &CancellationToken,
        report: &mut ProcessingReport,
    ) -> Result<(), Pdf2AnkiError> {
        self.logger.in_scope(|| {
            info!("Starting batch: {}", source_dir.display());
            let result = self.run_inner(source_dir, cancel, report);
            report.finish();
            match &result {
                Ok(()) => report.log_summary(),
                Err(Pdf2AnkiError::Cancelled) => {
                    warn!("Batch cancelled after {} PDFs", report.processed_pdfs);
                    report.log_summary();
                }
                Err(e) => error!("Batch aborted: {e}"),
            }
            self.progress.on_batch_complete(report);
            result
        })
    }

    fn run_inner(
        &self,
        source_dir: &Path,
        cancel: &CancellationToken,
        report: &mut ProcessingReport,
    ) -> Result<(), Pdf2AnkiError> {
        if let Some(scratch) = self.processor.scratch_dir() {
            if is_same_or_inside(source_dir, scratch) {
                return Err(Pdf2AnkiError::InvalidConfig(format!(
                    "Temp directory {} must not contain the PDF directory {}",
                    scratch.display(),
                    source_dir.display()
                )));
            }
        }
        if let Some(sync) = self.sync {
            sync.check_connection()?;
        }

        let pdfs = find_pdfs(source_dir)?;
        let total = pdfs.len();
        info!("Found {total} PDF files");
        self.progress.on_batch_start(total);

        for (i, pdf) in pdfs.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Pdf2AnkiError::Cancelled);
            }
            self.process_one(i + 1, total, pdf, cancel, report)?;
        }
        Ok(())
    }

    /// Errors returned from here abort the batch; everything else is logged.
    fn process_one(
        &self,
        index: usize,
        total: usize,
        pdf: &PdfFile,
        cancel: &CancellationToken,
        report: &mut ProcessingReport,
    ) -> Result<(), Pdf2AnkiError> {
        self.progress.on_pdf_start(index, total, &pdf.relative);

        let stats = match self.processor.process_pdf(&pdf.absolute, cancel) {
            Ok(stats) => stats,
            Err(e) if e.aborts_batch() => return Err(e),
            Err(e) => {
                error!("Error processing {}: {e}", pdf.relative.display());
                self.progress.on_pdf_error(index, total, &e.to_string());
                return Ok(());
            }
        };
        report.record_pdf(&stats);

        if stats.flashcard_count == 0 {
            info!("No flashcards found in {}", pdf.relative.display());
            self.progress.on_pdf_complete(index, total, 0);
            return Ok(());
        }

        let deck = deck_name_from_path(self.root_deck.as_deref(), &pdf.relative);
        match self.sync {
            None => info!(
                "Dry run: {} flashcards from {} left in the output directory (deck {deck})",
                stats.flashcard_count,
                pdf.relative.display()
            ),
            Some(sync) => {
                if let Err(e) = sync.create_deck(&deck) {
                    error!("Failed to create deck '{deck}': {e}");
                    report.record_unsynced(stats.image_pairs.len());
                } else if let Err(e) =
                    sync.add_all_flashcards(&deck, &stats.image_pairs, &stats.page_numbers, report)
                {
                    warn!("Deck '{deck}': {e}");
                }
            }
        }

        self.progress.on_pdf_complete(index, total, stats.flashcard_count);
        Ok(())
    }
}
