//! Logging setup for the CLI host.
//!
//! Logs go to stdout and to `vcl.log` in the platform config directory
//! (`~/.config/vcl/` on Linux), rotated at 10 MB. `DEBUG_LOGGING=1` turns on
//! debug output for the vcl crates.

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FILE: &str = "vcl.log";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

fn filter(debug_logging: bool) -> EnvFilter {
    if debug_logging {
        EnvFilter::new("info,vcl_core=debug,vcl_cli=debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered file output is lost. `None` means stdout only.
pub fn init() -> Option<WorkerGuard> {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let Some(log_dir) = dirs::config_dir().map(|dir| dir.join("vcl")) else {
        init_stdout_only(debug_logging);
        return None;
    };
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        // subscriber not installed yet
        eprintln!("Failed to create log directory {}: {e}, using stdout only", log_dir.display());
        init_stdout_only(debug_logging);
        return None;
    }

    let log_path: PathBuf = log_dir.join(LOG_FILE);
    let appender = match BasicRollingFileAppender::new(
        &log_path,
        RollingConditionBasic::new().max_size(MAX_LOG_BYTES),
        1,
    ) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", log_path.display());
            init_stdout_only(debug_logging);
            return None;
        }
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .with(filter(debug_logging))
        .init();

    tracing::info!(log_file = %log_path.display(), debug_logging, "Logging initialized");
    Some(guard)
}

fn init_stdout_only(debug_logging: bool) {
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(filter(debug_logging))
        .init();

    tracing::info!(debug_logging, "Logging initialized (stdout only)");
}
