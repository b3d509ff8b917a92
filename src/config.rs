//! Configuration types for flashcard extraction and sync.
//!
//! Extraction is controlled through [`ProcessorConfig`], built via its
//! [`ProcessorConfigBuilder`]; the connection to the flashcard application
//! through [`SyncConfig`]. Neither is read from or written to disk: front
//! ends map their own flags onto these structs.

use crate::error::Pdf2AnkiError;
use crate::sync::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Physical page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    /// Page size of a Goodnotes "standard" flashcard template.
    pub const STANDARD_FLASHCARD: PageDimensions = PageDimensions {
        width: 455.04,
        height: 587.52,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        Self::STANDARD_FLASHCARD
    }
}

/// Which predicates a page must satisfy to be treated as a flashcard.
///
/// All four combinations are valid. With both checks off every page is a
/// flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub check_dimensions: bool,
    pub check_markers: bool,
}

impl ProcessingOptions {
    /// Require both matching dimensions and QUESTION/ANSWER markers.
    pub const STRICT: ProcessingOptions = ProcessingOptions {
        check_dimensions: true,
        check_markers: true,
    };

    /// Treat every page as a flashcard.
    pub const ALL_PAGES: ProcessingOptions = ProcessingOptions {
        check_dimensions: false,
        check_markers: false,
    };
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self::STRICT
    }
}

/// Configuration for [`crate::processor::FlashcardProcessor`].
///
/// # Example
/// ```rust
/// use pdf2anki::{ProcessorConfig, ProcessingOptions};
///
/// let config = ProcessorConfig::builder()
///     .output_dir("flashcards")
///     .options(ProcessingOptions { check_dimensions: false, check_markers: true })
///     .dpi(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Scratch directory for full-page renders. Removed by `cleanup()`.
    pub temp_dir: PathBuf,

    /// Where `{base}_{hash8}_question.png` / `_answer.png` are written.
    pub output_dir: PathBuf,

    /// Target page size compared against each page when
    /// `options.check_dimensions` is set.
    pub dimensions: PageDimensions,

    pub options: ProcessingOptions,

    /// Rendering DPI used when rasterising a flashcard page. Range: 72–400. Default: 300.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// A 300-DPI render of an oversized page is capped on its longest edge,
    /// scaling the other proportionally.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        Self {
            temp_dir: tmp.join("pdf2anki-temp"),
            output_dir: tmp.join("pdf2anki-flashcards"),
            dimensions: PageDimensions::default(),
            options: ProcessingOptions::default(),
            dpi: 300,
            max_rendered_pixels: 4000,
            password: None,
        }
    }
}

impl ProcessorConfig {
    /// Create a new builder for `ProcessorConfig`.
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessorConfig`].
#[derive(Debug)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    pub fn temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.temp_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn dimensions(mut self, dims: PageDimensions) -> Self {
        self.config.dimensions = dims;
        self
    }

    pub fn options(mut self, options: ProcessingOptions) -> Self {
        self.config.options = options;
        self
    }

    pub fn check_dimensions(mut self, v: bool) -> Self {
        self.config.options.check_dimensions = v;
        self
    }

    pub fn check_markers(mut self, v: bool) -> Self {
        self.config.options.check_markers = v;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessorConfig, Pdf2AnkiError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2AnkiError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.options.check_dimensions
            && !(c.dimensions.width > 0.0 && c.dimensions.height > 0.0)
        {
            return Err(Pdf2AnkiError::InvalidConfig(format!(
                "Flashcard dimensions must be positive, got {} x {}",
                c.dimensions.width, c.dimensions.height
            )));
        }
        if is_same_or_inside(&c.temp_dir, &c.output_dir)
            || is_same_or_inside(&c.output_dir, &c.temp_dir)
        {
            return Err(Pdf2AnkiError::InvalidConfig(format!(
                "Temp directory {} and output directory {} must not be the same or nested",
                c.temp_dir.display(),
                c.output_dir.display()
            )));
        }
        Ok(self.config)
    }
}

/// Whether `path` is `dir` or lies somewhere below it.
///
/// Both sides are made absolute and resolved through their longest existing
/// ancestor, so `./notes`, `notes/` and a symlink to `notes` compare equal.
pub(crate) fn is_same_or_inside(path: &Path, dir: &Path) -> bool {
    resolve(path).starts_with(resolve(dir))
}

fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    // Canonicalize the deepest ancestor that exists and re-attach the rest.
    let mut missing = Vec::new();
    let mut existing = lexical.as_path();
    loop {
        if let Ok(real) = existing.canonicalize() {
            return missing.iter().rev().fold(real, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return lexical,
        }
    }
}

/// Connection settings for [`crate::sync::SyncService`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// AnkiConnect endpoint. Default: `http://localhost:8765`.
    pub endpoint: String,

    /// AnkiConnect protocol version sent with every request. Default: 6.
    pub api_version: u32,

    /// Name of the note type created for pdf2anki cards. Default: `Pdf2Anki`.
    pub model_name: String,

    /// Retry behaviour for every outbound request. Default: 3 attempts, 500 ms apart.
    pub retry: RetryPolicy,
}

impl SyncConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:8765";
    pub const DEFAULT_MODEL_NAME: &'static str = "Pdf2Anki";

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            api_version: 6,
            model_name: Self::DEFAULT_MODEL_NAME.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}
