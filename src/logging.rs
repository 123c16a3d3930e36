use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, writing to `file` (the terminal belongs to the UI).
///
/// `RUST_LOG` overrides `level`. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn init(level: &str, file: &Path) -> Result<WorkerGuard> {
    if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory: {:?}", dir))?;
    }
    let log_file = File::create(file).with_context(|| format!("Failed to create log file: {:?}", file))?;
    let (writer, guard) = tracing_appender::non_blocking(log_file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
