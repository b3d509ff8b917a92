//! CLI binary for pdf2anki.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessorConfig` / `SyncConfig`, runs the batch on a blocking worker and
//! prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2anki::logging::timestamped_log_path;
use pdf2anki::{
    BatchProgressCallback, BatchRunner, CancellationToken, FlashcardProcessor, LogSink, Logger,
    PageDimensions, PdfProcessor, Pdf2AnkiError, ProcessingReport,
    ProcessorConfig, ProgressCallback, RetryPolicy, SyncConfig, SyncService,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// A dry run never contacts Anki, so it starts straight with the scan.
fn spinner_message(dry_run: bool) -> &'static str {
    if dry_run {
        "Scanning for PDFs…"
    } else {
        "Connecting to Anki…"
    }
}

/// One bar for the whole batch, one log line per PDF.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
    flashcards: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports how many PDFs were found.
    fn new_dynamic(dry_run: bool) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message(spinner_message(dry_run));
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
            flashcards: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing");
        self.bar.reset_eta();
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_pdfs: usize) {
        self.activate_bar(total_pdfs);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_pdfs} PDF files"))
        ));
    }

    fn on_pdf_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(path.display().to_string());
    }

    fn on_pdf_complete(&self, index: usize, total: usize, flashcards: usize) {
        self.flashcards.fetch_add(flashcards, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} PDF {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{flashcards:>4} flashcards")),
        ));
        self.bar.inc(1);
    }

    fn on_pdf_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} PDF {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, report: &ProcessingReport) {
        self.bar.finish_and_clear();
        let errors = self.errors.load(Ordering::SeqCst);
        let status = if errors == 0 && report.failed_count == 0 {
            green("✔")
        } else {
            cyan("⚠")
        };
        eprintln!(
            "{} {} flashcards from {} PDFs  ({} added, {} skipped, {} failed)",
            status,
            bold(&self.flashcards.load(Ordering::SeqCst).to_string()),
            report.processed_pdfs,
            report.added_count,
            report.skipped_count,
            if report.failed_count == 0 {
                report.failed_count.to_string()
            } else {
                red(&report.failed_count.to_string())
            },
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Sync every flashcard page under notes/ into Anki
  pdf2anki notes/

  # Nest all decks under "School"
  pdf2anki --root-deck School notes/

  # Extract images only, without talking to Anki
  pdf2anki --dry-run -o cards/ notes/

  # Every page is a flashcard (skip both checks)
  pdf2anki --no-dimensions --no-markers notes/

  # Custom template size in points, and a log file
  pdf2anki --width 595.28 --height 841.89 --log-dir logs/ notes/

  # Machine-readable report
  pdf2anki --json notes/ > report.json

DECKS:
  Each PDF goes into a deck named after its path relative to the source
  directory: notes/biology/cells.pdf becomes "biology::cells".

ENVIRONMENT VARIABLES:
  PDF2ANKI_*        Every flag can be set through its environment variable
  PDFIUM_LIB_PATH   Path to an existing libpdfium
  RUST_LOG          Not used; pick the level with -v / --debug

SETUP:
  1. Install the AnkiConnect add-on and keep Anki open.
  2. Run:  pdf2anki notes/
"#;

/// Turn study-note PDF pages into flashcards and sync them to Anki.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2anki",
    version,
    about = "Turn study-note PDF pages into flashcards and sync them to Anki",
    long_about = "Scan a directory of PDF notes, pick out flashcard pages (by page size and the \
QUESTION/ANSWER markers), split each one into a question and an answer image, and add them to \
Anki through the AnkiConnect add-on. Cards are identified by a hash of the page, so re-running \
never creates duplicates.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory scanned recursively for PDF files.
    pdf_dir: PathBuf,

    /// Where question/answer PNGs are written.
    #[arg(short, long, env = "PDF2ANKI_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Scratch directory for full-page renders (the renders are removed afterwards).
    #[arg(long, env = "PDF2ANKI_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Parent deck for every generated deck.
    #[arg(long, env = "PDF2ANKI_ROOT_DECK")]
    root_deck: Option<String>,

    /// Flashcard page width in points.
    #[arg(long, env = "PDF2ANKI_WIDTH", default_value_t = PageDimensions::STANDARD_FLASHCARD.width)]
    width: f64,

    /// Flashcard page height in points.
    #[arg(long, env = "PDF2ANKI_HEIGHT", default_value_t = PageDimensions::STANDARD_FLASHCARD.height)]
    height: f64,

    /// Do not require the QUESTION/ANSWER markers.
    #[arg(long, env = "PDF2ANKI_NO_MARKERS")]
    no_markers: bool,

    /// Do not require the flashcard page size.
    #[arg(long, env = "PDF2ANKI_NO_DIMENSIONS")]
    no_dimensions: bool,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF2ANKI_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Longest rendered edge in pixels; larger pages get a lower DPI.
    #[arg(long, env = "PDF2ANKI_MAX_PIXELS", default_value_t = 4000,
          value_parser = clap::value_parser!(u32).range(100..))]
    max_pixels: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2ANKI_PASSWORD")]
    password: Option<String>,

    /// AnkiConnect endpoint.
    #[arg(long, env = "PDF2ANKI_ANKI_URL", default_value = SyncConfig::DEFAULT_ENDPOINT)]
    anki_url: String,

    /// Attempts per AnkiConnect request.
    #[arg(long, env = "PDF2ANKI_MAX_ATTEMPTS", default_value_t = RetryPolicy::DEFAULT_MAX_ATTEMPTS,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Delay between attempts in milliseconds.
    #[arg(long, env = "PDF2ANKI_RETRY_DELAY_MS", default_value_t = 500)]
    retry_delay_ms: u64,

    /// Also write logs to a timestamped file in this directory.
    #[arg(long, env = "PDF2ANKI_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print the final report as JSON on stdout.
    #[arg(long, env = "PDF2ANKI_JSON")]
    json: bool,

    /// Extract images only; do not contact Anki.
    #[arg(long, env = "PDF2ANKI_DRY_RUN")]
    dry_run: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2ANKI_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level logs.
    #[arg(short, long, env = "PDF2ANKI_VERBOSE")]
    verbose: bool,

    /// Enable TRACE-level logs.
    #[arg(long, env = "PDF2ANKI_DEBUG")]
    debug: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2ANKI_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let logger = build_logger(&cli, show_progress)?;

    // ── Build config ─────────────────────────────────────────────────────
    let processor_config = build_processor_config(&cli)?;
    let sync_config = SyncConfig::default()
        .with_endpoint(cli.anki_url.clone())
        .with_retry(RetryPolicy::fixed(
            cli.max_attempts,
            Duration::from_millis(cli.retry_delay_ms),
        ));

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic(cli.dry_run) as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    // ── Ctrl-C → cancel ──────────────────────────────────────────────────
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n{} Cancelling after the current page…", cyan("⚠"));
                cancel.cancel();
            }
        });
    }

    // ── Run batch ────────────────────────────────────────────────────────
    // pdfium and the blocking HTTP client both live on the worker thread.
    let source_dir = cli.pdf_dir.clone();
    let root_deck = cli.root_deck.clone();
    let dry_run = cli.dry_run;
    let (report, outcome) = tokio::task::spawn_blocking(move || {
        run_batch(
            processor_config,
            sync_config,
            &source_dir,
            root_deck,
            dry_run,
            progress_cb,
            logger,
            &cancel,
        )
    })
    .await
    .context("Batch worker panicked")??;

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        println!("{report}");
    }

    match outcome {
        Ok(()) => Ok(()),
        Err(Pdf2AnkiError::Cancelled) => {
            eprintln!("{} Cancelled; partial report shown above", cyan("⚠"));
            std::process::exit(130);
        }
        Err(e) => Err(e).context("Processing failed"),
    }
}

/// Build the processor, optionally the sync service, and run one batch.
///
/// Setup failures are returned as the outer error; the batch outcome is
/// returned alongside the report so a partial report can still be printed.
#[allow(clippy::too_many_arguments)]
fn run_batch(
    processor_config: ProcessorConfig,
    sync_config: SyncConfig,
    source_dir: &Path,
    root_deck: Option<String>,
    dry_run: bool,
    progress: Option<ProgressCallback>,
    logger: Logger,
    cancel: &CancellationToken,
) -> Result<(ProcessingReport, Result<(), Pdf2AnkiError>)> {
    let processor = FlashcardProcessor::new(processor_config, logger.clone())
        .context("Failed to initialise the PDF processor")?;

    let mut report = ProcessingReport::start();
    let outcome = if dry_run {
        let mut runner = BatchRunner::dry_run(&processor)
            .root_deck(root_deck)
            .logger(logger);
        if let Some(cb) = progress {
            runner = runner.progress(cb);
        }
        runner.run(source_dir, cancel, &mut report)
    } else {
        let sync = SyncService::new(sync_config, logger.clone())
            .context("Failed to create the AnkiConnect client")?;
        let mut runner = BatchRunner::new(&processor, &sync)
            .root_deck(root_deck)
            .logger(logger);
        if let Some(cb) = progress {
            runner = runner.progress(cb);
        }
        runner.run(source_dir, cancel, &mut report)
    };

    processor
        .cleanup()
        .context("Failed to remove the temp directory")?;
    Ok((report, outcome))
}

/// Default INFO, `-v` DEBUG, `--debug` TRACE. While the progress bar is
/// shown the console only gets errors unless a verbose flag is set; the log
/// file (if any) always gets the full level.
fn build_logger(cli: &Cli, show_progress: bool) -> Result<Logger> {
    let verbose = cli.verbose || cli.debug;
    let level = if cli.debug {
        LevelFilter::TRACE
    } else if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_quiet = cli.quiet || (show_progress && !verbose);

    let logger = match &cli.log_dir {
        Some(dir) => {
            let path = timestamped_log_path(dir);
            let sink = if console_quiet {
                LogSink::File(path)
            } else {
                LogSink::StderrAndFile(path)
            };
            Logger::new(level, sink)
        }
        None if console_quiet => Logger::new(LevelFilter::ERROR, LogSink::Stderr),
        None => Logger::new(level, LogSink::Stderr),
    };
    logger.context("Failed to set up logging")
}

/// Map CLI args to `ProcessorConfig`.
fn build_processor_config(cli: &Cli) -> Result<ProcessorConfig> {
    let mut builder = ProcessorConfig::builder()
        .dimensions(PageDimensions::new(cli.width, cli.height))
        .check_dimensions(!cli.no_dimensions)
        .check_markers(!cli.no_markers)
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels);

    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}
