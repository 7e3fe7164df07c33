use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Route tracing output to `<dir>/budgetrack.log`. The TUI owns the terminal,
/// so nothing is written to stdout or stderr.
pub(crate) fn init(dir: &Path, level: Option<&str>) -> Result<()> {
    let path = dir.join("budgetrack.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::new("info"),
    };

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_writer(Arc::new(log_file));

    // A second init (tests, repeated calls) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
    Ok(())
}
