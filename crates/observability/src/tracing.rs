//! Tracing/logging initialization.
//!
//! Console output always goes to stderr so stdout stays free for purchase
//! receipts. An optional rolling file layer records every marketplace call
//! as JSON, one file per day.

use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

pub use tracing_appender::non_blocking::WorkerGuard;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Rolling log file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    pub directory: PathBuf,
    /// File name prefix; the date is appended on rotation.
    pub prefix: String,
}

impl FileOutput {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
    pub file: Option<FileOutput>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_filter: "info".to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    pub fn with_file(mut self, file: FileOutput) -> Self {
        self.file = Some(file);
        self
    }
}

/// Install the global subscriber described by `config`.
///
/// Returns the file writer guard when a log file is configured; keep it alive
/// for as long as logs should be flushed. If a global subscriber is already
/// installed this is a no-op.
pub fn init_with(config: &LogConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::SystemTime)
        .with_target(false)
        .with_thread_names(true);
    match config.format {
        LogFormat::Pretty => layers.push(console.boxed()),
        LogFormat::Json => layers.push(console.json().boxed()),
    }

    let guard = config.file.as_ref().map(|file| {
        let appender = tracing_appender::rolling::daily(&file.directory, &file.prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .boxed(),
        );
        guard
    });

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();

    guard
}
