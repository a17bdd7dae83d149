use std::env;
use std::path::Path;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/tidy.log";

/// Console plus file logging. `TRACING_LEVEL` sets the filter (default
/// `info`), `LOG_FILE_PATH` the log file. The returned guard flushes the
/// file writer on drop and must live until exit.
pub fn init_logger() -> WorkerGuard {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let (filter_layer, bad_filter) = match EnvFilter::try_new(&filter) {
        Ok(layer) => (layer, false),
        Err(_) => (EnvFilter::new("info"), true),
    };

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let log_file = Path::new(&log_file_path);
    let log_dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let log_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "tidy.log".into());

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    if bad_filter {
        warn!("Ignoring invalid TRACING_LEVEL '{}', using info", filter);
    }
    debug!("Logging to stdout and {}", log_file.display());

    guard
}
