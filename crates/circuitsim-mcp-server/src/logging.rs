//! Tracing setup shared by every transport.
//!
//! The stdio transport owns stdout for MCP frames, so console output always
//! goes to stderr.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

use crate::config::LoggingConfig;

pub const LOG_FILE_PREFIX: &str = "circuitsim.log";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// life of the process or buffered file output is lost.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) -> Option<WorkerGuard> {
    let level = if verbose { "debug" } else { config.level.as_str() };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_line_number(true);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Cannot create log directory {}: {}", dir.display(), e);
                (None, None)
            }
        },
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).ok();

    guard
}
