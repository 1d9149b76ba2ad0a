//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem from the `[log]` section
//! - Console, daily-rolling file, or both
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON or text per `log.format`
//! - `RUST_LOG` overrides `log.level` when set

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::schema::{LogConfig, LogFormat, LogOutput};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file in {}: {source}", dir.display())]
    File {
        dir: PathBuf,
        #[source]
        source: InitError,
    },

    #[error("logging already initialised: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the background file writer alive. Drop it last.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
pub fn init(config: &LogConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut file_guard = None;

    if config.output.writes_file() {
        let (dir, prefix) = file_target(&config.file_path);
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(prefix)
            .max_log_files(config.max_backups.max(1) as usize)
            .build(&dir)
            .map_err(|source| LoggingError::File { dir, source })?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt_layer(config.format, writer, false));
        file_guard = Some(guard);
    }

    if config.output != LogOutput::File {
        layers.push(fmt_layer(config.format, std::io::stderr, true));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(LoggingGuard { _file: file_guard })
}

/// Console subscriber used while the configuration that drives [`init`] is
/// still being loaded. Install it with `tracing::subscriber::with_default`.
pub fn bootstrap() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish()
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);

    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Text => layer.boxed(),
    }
}

/// Split `file_path` into the directory and file name prefix the rolling
/// appender expects.
fn file_target(file_path: &str) -> (PathBuf, String) {
    let path = Path::new(file_path);
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("app.log")
        .to_string();
    (dir, prefix)
}
