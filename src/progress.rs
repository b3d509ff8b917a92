//! Progress-callback trait for per-PDF batch events.
//!
//! Pass an [`Arc<dyn BatchProgressCallback>`] to [`crate::batch::BatchRunner::progress`]
//! to receive events as each PDF is processed and synced. The library knows
//! nothing about how they are shown; the CLI drives an `indicatif` bar, a GUI
//! could forward them over a channel.
//!
//! # Example
//!
//! ```rust
//! use pdf2anki::BatchProgressCallback;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     flashcards: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_pdf_complete(&self, index: usize, total: usize, flashcards: usize) {
//!         self.flashcards.fetch_add(flashcards, Ordering::SeqCst);
//!         eprintln!("PDF {}/{} done ({} flashcards)", index, total, flashcards);
//!     }
//! }
//!
//! let cb: Arc<dyn BatchProgressCallback> = Arc::new(CountingCallback {
//!     flashcards: AtomicUsize::new(0),
//! });
//! cb.on_pdf_complete(1, 3, 5);
//! ```

use crate::output::ProcessingReport;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch runner as it works through the PDFs.
///
/// The runner is single-threaded, but the callback is usually owned by a
/// front-end thread, so implementations must be `Send + Sync`. All methods
/// default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the source directory has been scanned.
    fn on_batch_start(&self, total_pdfs: usize) {
        let _ = total_pdfs;
    }

    /// Called before a PDF is opened.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    /// * `path`  — path relative to the scanned root
    fn on_pdf_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called after a PDF's flashcards have been extracted and synced.
    fn on_pdf_complete(&self, index: usize, total: usize, flashcards: usize) {
        let _ = (index, total, flashcards);
    }

    /// Called when a PDF could not be processed; the batch moves on.
    fn on_pdf_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once at the end, also for cancelled runs.
    fn on_batch_complete(&self, report: &ProcessingReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Shared handle to a callback.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
