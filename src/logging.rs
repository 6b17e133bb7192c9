use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "ksiso.log";

fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Open `<log_dir>/ksiso.log` for appending, creating the directory first
pub fn open_log_file(log_dir: &Path) -> Result<(PathBuf, std::fs::File)> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    Ok((path, file))
}

/// Install the global subscriber: stdout plus an append-mode log file.
///
/// `RUST_LOG` overrides the level picked from `verbose`.
pub fn init_logging(log_dir: &Path, verbose: bool) -> Result<PathBuf> {
    let (path, file) = open_log_file(log_dir)?;

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_writer(io::stdout)
        .with_filter(env_filter(verbose));

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(env_filter(verbose));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    tracing::debug!("Logging initialized - writing to stdout and {}", path.display());
    Ok(path)
}
