//! File logging through tracing
//!
//! The terminal belongs to the host's status line and command output, so
//! diagnostics go to a daily rolling file under the user data dir:
//!
//! ```bash
//! LEMONADE_LOG=debug lemonade
//! LEMONADE_LOG=lemonade_daemon=trace,argon=debug lemonade
//! ```
//!
//! Argon's own output is logged under the `argon` target.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "LEMONADE_LOG";

const DEFAULT_DIRECTIVES: &str = "lemonade=info,warn";
const LOG_FILE_PREFIX: &str = "lemonade.log";

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes the writer.
pub fn init() -> Result<WorkerGuard> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("──── Lemonade {} ────", env!("CARGO_PKG_VERSION"));
    tracing::info!("Logging to {}", log_dir.display());

    Ok(guard)
}

/// Filter from [`LOG_ENV`], falling back to `lemonade=info,warn`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// `<data_local_dir>/lemonade/logs`
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lemonade")
        .join("logs")
}
