//! Values produced by the pipeline: image pairs, per-PDF stats and the
//! per-run report.

use crate::error::PageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Lowercase hex SHA-256 of a rendered page's pixels.
///
/// The full digest is the dedupe key; [`ContentHash::short`] is embedded in
/// file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub const SHORT_LEN: usize = 8;

    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, or the whole string if shorter.
    pub fn short(&self) -> &str {
        self.0.get(..Self::SHORT_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Question/answer images cut from one flashcard page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePair {
    pub question: PathBuf,
    pub answer: PathBuf,
    /// Hash of the full, unsplit page.
    pub hash: ContentHash,
}

/// Result of processing one PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub pdf_path: PathBuf,
    pub flashcard_count: usize,
    pub image_pairs: Vec<ImagePair>,
    /// 1-based; `page_numbers[i]` belongs to `image_pairs[i]`.
    pub page_numbers: Vec<usize>,
    pub pages_scanned: usize,
    /// Pages dropped because of a retrieval, render or split failure.
    pub page_errors: Vec<PageError>,
}

impl ProcessingStats {
    pub fn new(pdf_path: impl Into<PathBuf>) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            ..Default::default()
        }
    }

    pub(crate) fn push_pair(&mut self, pair: ImagePair, page_number: usize) {
        self.image_pairs.push(pair);
        self.page_numbers.push(page_number);
        self.flashcard_count += 1;
    }
}

/// A flashcard that was already present in the flashcard application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCardInfo {
    pub deck_name: String,
    pub hash: ContentHash,
    pub page_number: usize,
}

impl fmt::Display for SkippedCardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Page {}, Hash:{})",
            self.deck_name, self.page_number, self.hash
        )
    }
}

/// Terminal state of a single synced flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Added { note_id: u64 },
    Skipped { existing_note_id: u64 },
}

/// Cumulative counters for one batch run. Counters only ever grow.
///
/// After every flashcard in a batch has been handled,
/// `added_count + skipped_count + failed_count == total_processed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub total_processed: usize,
    pub added_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub skipped_cards: Vec<SkippedCardInfo>,
    pub processed_pdfs: usize,
    pub total_flashcards: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ProcessingReport {
    /// A fresh report with `start_time` set to now.
    pub fn start() -> Self {
        Self {
            total_processed: 0,
            added_count: 0,
            skipped_count: 0,
            failed_count: 0,
            skipped_cards: Vec::new(),
            processed_pdfs: 0,
            total_flashcards: 0,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn record_pdf(&mut self, stats: &ProcessingStats) {
        self.processed_pdfs += 1;
        self.total_flashcards += stats.flashcard_count;
    }

    pub(crate) fn record_attempt(&mut self) {
        self.total_processed += 1;
    }

    pub(crate) fn record_added(&mut self) {
        self.added_count += 1;
    }

    pub(crate) fn record_skipped(&mut self, card: SkippedCardInfo) {
        self.skipped_count += 1;
        self.skipped_cards.push(card);
    }

    pub(crate) fn record_failed(&mut self) {
        self.failed_count += 1;
    }

    /// Count `n` flashcards that could not even be attempted as failed.
    pub(crate) fn record_unsynced(&mut self, n: usize) {
        self.total_processed += n;
        self.failed_count += n;
    }

    /// Stamp `end_time`. Calling it again moves the stamp forward.
    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Elapsed time up to `end_time`, or up to now while still running.
    pub fn time_taken(&self) -> std::time::Duration {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).to_std().unwrap_or_default()
    }

    /// Log the completion summary and the skipped-card list at INFO.
    pub fn log_summary(&self) {
        info!("{}", Banner("PROCESSING COMPLETE"));
        for line in self.summary_lines() {
            info!("{line}");
        }
        if !self.skipped_cards.is_empty() {
            info!("{}", Banner("SKIPPED CARDS"));
            for card in &self.skipped_cards {
                info!("- {card}");
            }
        }
    }

    fn summary_lines(&self) -> [String; 6] {
        [
            format!("- Total PDFs processed: {}", self.processed_pdfs),
            format!("- Total flashcards found: {}", self.total_flashcards),
            format!("- Cards Added: {}", self.added_count),
            format!("- Cards Skipped: {}", self.skipped_count),
            format!("- Cards Failed: {}", self.failed_count),
            format!("- Time Taken: {:.2?}", self.time_taken()),
        ]
    }
}

impl Default for ProcessingReport {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for ProcessingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", Banner("PROCESSING COMPLETE"))?;
        for line in self.summary_lines() {
            writeln!(f, "{line}")?;
        }
        if !self.skipped_cards.is_empty() {
            writeln!(f, "{}", Banner("SKIPPED CARDS"))?;
            for card in &self.skipped_cards {
                writeln!(f, "- {card}")?;
            }
        }
        Ok(())
    }
}

struct Banner(&'static str);

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = format!("+{}+", "-".repeat(78));
        writeln!(f, "{rule}")?;
        writeln!(f, "|{:^78}|", self.0)?;
        write!(f, "{rule}")
    }
}
