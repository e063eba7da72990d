use anyhow::Context;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_rolling_file::{RollingConditionBase, RollingFileAppender};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LoggingConfig;

/// Install the global subscriber: a console layer always, plus a rolling
/// file layer when the config names a log file.
///
/// `verbose` wins over the configured level. Returns the guard for the file
/// writer's background thread, if any; the caller must hold it until exit
/// or buffered lines are lost.
pub fn init_logging(
    config: Option<&LoggingConfig>,
    verbose: bool,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if verbose {
        Level::DEBUG
    } else {
        config
            .and_then(|c| Level::from_str(&c.level).ok())
            .unwrap_or(Level::INFO)
    };

    let console = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(LevelFilter::from_level(level));

    let mut file_layer = None;
    let mut guard = None;
    if let Some((config, file)) = config.and_then(|c| c.file.as_deref().map(|f| (c, f))) {
        let (writer, worker) = rolling_log_writer(config, file)?;
        file_layer = Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::from_level(level)),
        );
        guard = Some(worker);
    }

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Non-blocking writer that rolls `file` once it exceeds the configured
/// size, keeping a bounded number of old files.
fn rolling_log_writer(
    config: &LoggingConfig,
    file: &str,
) -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Some(dir) = Path::new(file).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    let roll_when = RollingConditionBase::new().max_size(config.roll_size_mb * 1024 * 1024);
    let appender = RollingFileAppender::new(file, roll_when, config.keep_files)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {file}: {e}"))?;

    Ok(tracing_appender::non_blocking(appender))
}
