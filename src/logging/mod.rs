// Logging setup - tracing subscriber for the binary
//
// Logs go to stderr. When file logging is enabled a second, JSON-formatted
// layer writes to a rolling file through a non-blocking writer; the returned
// guard must stay alive until exit so buffered lines get flushed.
//
// Precedence for the filter: RUST_LOG env var > config level > "info".

use crate::config::{LogRotation, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a configured level
pub fn default_filter(level: &str) -> String {
    format!("og_editable={},reqwest=warn,hyper=warn", level)
}

fn file_appender(config: &LoggingConfig) -> RollingFileAppender {
    match config.file_rotation {
        LogRotation::Hourly => {
            tracing_appender::rolling::hourly(&config.file_dir, &config.file_prefix)
        }
        LogRotation::Daily => tracing_appender::rolling::daily(&config.file_dir, &config.file_prefix),
        LogRotation::Never => tracing_appender::rolling::never(&config.file_dir, &config.file_prefix),
    }
}

/// Install the global subscriber
///
/// Returns the file writer guard when file logging is active.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if config.file_enabled {
        if let Err(e) = std::fs::create_dir_all(&config.file_dir) {
            eprintln!(
                "Warning: Could not create log directory {:?}: {}",
                config.file_dir, e
            );
        } else {
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(config));
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_targets_crate() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("og_editable=debug"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }
}
