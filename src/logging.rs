//! Logging setup for dataset-tool
//!
//! Log records always go to stderr, so stdout stays free for command output.
//! When [`AppSettings::log_to_file`] is set they are also written to
//! daily-rotated files in the platform data directory.
//!
//! ```no_run
//! use dataset_tool::{config, logging};
//!
//! let settings = config::load_settings();
//! logging::init(&settings).expect("Failed to initialize logging");
//!
//! tracing::info!("Ready");
//! ```

use crate::config::AppSettings;
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/dataset-tool/logs`
/// - macOS: `~/Library/Application Support/dataset-tool/logs`
/// - Linux: `~/.local/share/dataset-tool/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("dataset-tool").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn file_appender(log_dir: &std::path::Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} file appender"))
}

/// Initializes the logging system
///
/// The level defaults to `info` and can be overridden with `RUST_LOG`. With
/// file logging enabled two files are written: `dataset-tool.<date>.log`
/// with every record, and `error.<date>.log` with warnings and errors only.
///
/// # Errors
///
/// Returns error if the filter is invalid, the log directory cannot be
/// created, or a global subscriber is already installed
pub fn init(settings: &AppSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let (file_layers, log_dir) = if settings.log_to_file {
        let log_dir = get_log_dir()?;
        let all_logs = fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_appender(&log_dir, "dataset-tool")?);
        let error_logs = fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_appender(&log_dir, "error")?)
            .with_filter(EnvFilter::new("warn"));
        (Some(all_logs.and_then(error_logs)), Some(log_dir))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = log_dir {
        tracing::debug!("Logging initialized, log directory: {}", dir.display());
    }
    Ok(())
}
