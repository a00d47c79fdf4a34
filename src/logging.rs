use std::fs::File;
use std::io::{sink, stderr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Where log lines end up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTarget {
    /// The map owns the terminal, so logs need a file or nowhere
    File(PathBuf),
    Discard,
    Stderr,
}

impl LogTarget {
    /// Interactive map: `log_file` or nothing at all
    pub fn interactive(log_file: Option<PathBuf>) -> Self {
        log_file.map_or(Self::Discard, Self::File)
    }
}

/// Install the global subscriber; keep the guard alive to flush on exit.
pub fn init(target: LogTarget) -> Result<WorkerGuard> {
    let format_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard, ansi) = match target {
        LogTarget::File(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (writer, guard, false)
        }
        LogTarget::Discard => {
            let (writer, guard) = tracing_appender::non_blocking(sink());
            (writer, guard, false)
        }
        LogTarget::Stderr => {
            let (writer, guard) = tracing_appender::non_blocking(stderr());
            (writer, guard, true)
        }
    };

    let subscriber_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_filter(format_filter);

    tracing_subscriber::Registry::default()
        .with(subscriber_layer)
        .try_init()?;

    Ok(guard)
}
