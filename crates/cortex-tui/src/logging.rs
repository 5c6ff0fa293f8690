use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILTER_ENV: &str = "CORTEX_LOG";

/// `<data_local_dir>/cortex/cortex.log`, or `./cortex.log` when there is no
/// data directory.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("cortex").join("cortex.log"))
        .unwrap_or_else(|| PathBuf::from("cortex.log"))
}

/// Send tracing output to a file; the terminal belongs to the UI.
///
/// The returned guard flushes buffered lines on drop and must outlive the
/// event loop.
pub fn init(log_file: Option<&Path>) -> Result<WorkerGuard> {
    let path = log_file.map(Path::to_path_buf).unwrap_or_else(default_log_path);

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cortex.log");
    fs::create_dir_all(directory)?;

    let file_appender = tracing_appender::rolling::never(directory, filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(guard)
}
