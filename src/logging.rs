//! Logging setup.
//!
//! The process runs in the `windows` subsystem with no console, so log lines
//! go to `desk_toggle.log` in the data directory through a non-blocking
//! appender. Default level is `info`; `RUST_LOG` overrides it.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialise logging into `dir`. The returned guard flushes the appender on
/// drop and must be held for the life of the process.
pub fn init(dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(dir, "desk_toggle.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    guard
}
