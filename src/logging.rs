//! Injectable logging capability.
//!
//! The library logs through `tracing` macros but never installs a global
//! subscriber. Each component holds a [`Logger`] and runs its public
//! operations inside [`Logger::in_scope`], so two pipelines in one process can
//! log at different levels to different sinks.
//!
//! ```rust
//! use pdf2anki::logging::{Logger, LogSink};
//! use tracing::level_filters::LevelFilter;
//!
//! let logger = Logger::new(LevelFilter::DEBUG, LogSink::Stderr).unwrap();
//! logger.in_scope(|| tracing::debug!("visible on stderr"));
//! ```

use crate::error::Pdf2AnkiError;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    Stdout,
    /// Plain-text file, created (or truncated) when the logger is built.
    File(PathBuf),
    /// Console and file at once.
    StderrAndFile(PathBuf),
}

/// A minimum level plus an output sink, packaged as a `tracing` dispatcher.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    level: Option<LevelFilter>,
}

impl Logger {
    /// Build a logger writing at `level` and above to `sink`.
    pub fn new(level: LevelFilter, sink: LogSink) -> Result<Self, Pdf2AnkiError> {
        let dispatch = match sink {
            LogSink::Stderr => build_dispatch(level, std::io::stderr, true),
            LogSink::Stdout => build_dispatch(level, std::io::stdout, true),
            LogSink::File(path) => {
                let file = open_log_file(&path)?;
                build_dispatch(level, Mutex::new(file), false)
            }
            LogSink::StderrAndFile(path) => {
                let file = open_log_file(&path)?;
                build_dispatch(level, std::io::stderr.and(Mutex::new(file)), false)
            }
        };
        Ok(Self {
            dispatch,
            level: Some(level),
        })
    }

    /// Build a logger around any `MakeWriter`, without ANSI colours.
    pub fn from_writer<W>(level: LevelFilter, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        Self {
            dispatch: build_dispatch(level, writer, false),
            level: Some(level),
        }
    }

    /// Use whatever subscriber is current for the calling thread.
    pub fn inherit() -> Self {
        Self {
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
            level: None,
        }
    }

    /// Drop every event.
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
            level: Some(LevelFilter::OFF),
        }
    }

    /// Run `f` with this logger as the thread's default subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::inherit()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish()
    }
}

/// `{dir}/pdf2anki_{YYYY-MM-DD_HH-MM-SS}.log`
pub fn timestamped_log_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("pdf2anki_{stamp}.log"))
}

fn build_dispatch<W>(level: LevelFilter, writer: W, ansi: bool) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .finish();
    Dispatch::new(subscriber)
}

fn open_log_file(path: &Path) -> Result<File, Pdf2AnkiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Pdf2AnkiError::LogSinkFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    File::create(path).map_err(|e| Pdf2AnkiError::LogSinkFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
