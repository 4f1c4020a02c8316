// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "binrain=info";

/// Installs the global subscriber.
///
/// The terminal belongs to the animation, so logs only go to `log_file`, or
/// to stderr when stderr has been redirected away from the terminal. The
/// returned guard flushes the file writer when dropped and must outlive the
/// render loop.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // RUST_LOG wins over the built-in default.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    if let Some(path) = log_file {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("could not create log directory {}", dir.display()))?;
        let file_name = path
            .file_name()
            .with_context(|| format!("--log-file {} has no file name", path.display()))?;

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
        return Ok(Some(guard));
    }

    if !std::io::stderr().is_terminal() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
    Ok(None)
}
