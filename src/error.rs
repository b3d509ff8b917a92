//! Error types for the pdf2anki library.
//!
//! Errors are split by how far they are allowed to travel:
//!
//! * [`Pdf2AnkiError`] — **Fatal** for the unit of work that returned it.
//!   Returned from batch entry points only for the two conditions that abort a
//!   run (the flashcard application is unreachable, or the run was cancelled)
//!   plus setup failures that happen before any page is touched. Per-PDF open
//!   failures use the same type but the batch logs them and moves on.
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be classified,
//!   rendered or split. Stored in [`crate::output::ProcessingStats`] so callers
//!   can see exactly which pages were dropped.
//!
//! * [`SplitError`] — returned by [`crate::pipeline::split::Splitter`].
//!
//! * [`SyncError`] — one flashcard (or one request) failed to reach the
//!   flashcard application. Counted in the report, never unwinds the batch.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the pdf2anki library.
#[derive(Debug, Error)]
pub enum Pdf2AnkiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The source directory contains no PDF files at any depth.
    #[error("No PDF files found in '{dir}' or its subdirectories")]
    NoPdfsFound { dir: PathBuf },

    /// Walking the source directory failed.
    #[error("Failed to scan '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output or temp directory.
    #[error("Failed to prepare directory '{path}': {source}")]
    DirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not open the log file sink.
    #[error("Failed to open log file '{path}': {source}")]
    LogSinkFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Flashcard application ─────────────────────────────────────────────
    /// AnkiConnect did not answer the version request.
    #[error(
        "Could not connect to Anki at {endpoint}: {detail}\n\n\
Please ensure:\n\
  1. Anki is running (https://apps.ankiweb.net/#download)\n\
  2. The AnkiConnect add-on is installed (code: 2055492159)\n\
  3. Anki has been restarted after installing AnkiConnect\n"
    )]
    ConnectionFailed { endpoint: String, detail: String },

    // ── Run control ───────────────────────────────────────────────────────
    /// The cancellation token fired; output produced so far is left in place.
    #[error("Processing cancelled")]
    Cancelled,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, place it next to the binary, or set\n\
PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2AnkiError {
    /// True for the errors that must stop the whole batch.
    pub fn aborts_batch(&self) -> bool {
        matches!(
            self,
            Pdf2AnkiError::Cancelled | Pdf2AnkiError::ConnectionFailed { .. }
        )
    }
}

/// A non-fatal error for a single page.
///
/// Page numbers are 1-based. The page is skipped and processing continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page size could not be read from the document.
    #[error("Page {page}: could not read page bounds: {detail}")]
    BoundsUnavailable { page: usize, detail: String },

    /// Text extraction failed.
    #[error("Page {page}: could not extract text: {detail}")]
    TextUnavailable { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The full-page render could not be written to the temp directory.
    #[error("Page {page}: could not save page image: {detail}")]
    SaveFailed { page: usize, detail: String },

    /// Splitting into question/answer halves failed.
    #[error("Page {page}: split failed: {detail}")]
    SplitFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-based page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::BoundsUnavailable { page, .. }
            | PageError::TextUnavailable { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::SaveFailed { page, .. }
            | PageError::SplitFailed { page, .. } => *page,
        }
    }
}

/// Errors from [`crate::pipeline::split::Splitter`].
///
/// A failure after the question half was written does not remove it; the
/// caller treats the split as failed and may find a stray question file.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Raster too small to produce two non-empty halves.
    #[error("Image {width}x{height} is too small to split into question and answer")]
    Degenerate { width: u32, height: u32 },

    /// The source image could not be opened or decoded.
    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An output PNG could not be encoded or written.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors talking to the flashcard application.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("transport error: {detail}")]
    Transport { detail: String },

    /// The response was not a valid `{error, result}` envelope, or `result`
    /// did not have the expected shape.
    #[error("malformed response to '{action}': {detail}")]
    MalformedResponse { action: String, detail: String },

    /// The envelope carried a non-null `error`.
    #[error("anki error on '{action}': {message}")]
    Application { action: String, message: String },

    /// Every attempt failed; `last` is the error from the final attempt.
    #[error("'{action}' failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        action: String,
        attempts: u32,
        #[source]
        last: Box<SyncError>,
    },

    /// A question/answer image could not be read for upload.
    #[error("failed to read media file '{path}': {source}")]
    MediaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some flashcards in a batch failed; the rest were attempted.
    #[error("failed to add {failed} out of {total} flashcards")]
    BatchIncomplete { failed: usize, total: usize },
}

impl SyncError {
    /// Number of attempts made, if this error came out of the retry loop.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            SyncError::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
