use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "survey_flow=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Initializes console logging, plus daily-rolling JSON file logs when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// life of the process.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Console goes to stderr so stdout stays clean JSON output.
    match log_dir {
        Some(dir) => {
            let _ = fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, "survey_flow.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
            let console_layer = fmt::layer().with_writer(std::io::stderr);

            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(file_layer)
                .with(console_layer)
                .try_init();
            Some(guard)
        }
        None => {
            let console_layer = fmt::layer().with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer)
                .try_init();
            None
        }
    }
}
