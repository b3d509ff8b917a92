//! # pdf2anki
//!
//! Turn study-note PDF pages into question/answer flashcards and sync them to
//! Anki through the AnkiConnect add-on.
//!
//! ## How a page becomes a card
//!
//! Note-taking apps such as Goodnotes export flashcard templates as pages of
//! a fixed size with the words `QUESTION` and `ANSWER` printed on them. A page
//! that passes the enabled checks is rendered, fingerprinted, and cut in half:
//! the top half is the question, the bottom half the answer. The fingerprint
//! (a SHA-256 over the page's pixels) is stored in a hidden field on the
//! note, so re-running over unchanged notes never creates duplicates.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source dir
//!  │
//!  ├─ 1. Scan      find *.pdf recursively, check %PDF magic
//!  ├─ 2. Classify  page size (±1 pt, either orientation) + QUESTION/ANSWER text
//!  ├─ 3. Render    rasterise flashcard pages via pdfium
//!  ├─ 4. Hash      SHA-256 of the full-page pixels
//!  ├─ 5. Split     {pdf}_{hash8}_question.png / _answer.png
//!  └─ 6. Sync      deck per PDF, media upload, addNote unless the hash exists
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2anki::{
//!     BatchRunner, CancellationToken, FlashcardProcessor, Logger, PdfProcessor,
//!     ProcessingReport, ProcessorConfig, SyncConfig, SyncService,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let logger = Logger::inherit();
//!     let processor = FlashcardProcessor::new(ProcessorConfig::default(), logger.clone())?;
//!     let sync = SyncService::new(SyncConfig::default(), logger.clone())?;
//!
//!     let mut report = ProcessingReport::start();
//!     BatchRunner::new(&processor, &sync)
//!         .root_deck(Some("School".into()))
//!         .logger(logger)
//!         .run("notes/".as_ref(), &CancellationToken::new(), &mut report)?;
//!     processor.cleanup()?;
//!
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2anki` binary (clap + anyhow + indicatif + tokio) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2anki = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod progress;
pub mod sync;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::BatchRunner;
pub use cancel::CancellationToken;
pub use config::{
    PageDimensions, ProcessingOptions, ProcessorConfig, ProcessorConfigBuilder, SyncConfig,
};
pub use error::{PageError, Pdf2AnkiError, SplitError, SyncError};
pub use logging::{LogSink, Logger};
pub use output::{
    ContentHash, ImagePair, ProcessingReport, ProcessingStats, SkippedCardInfo, SyncOutcome,
};
pub use processor::{FlashcardProcessor, PdfProcessor};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use sync::{HttpTransport, RetryPolicy, SyncService, Transport};
