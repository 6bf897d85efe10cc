use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{AppError, AppResult};

const DEFAULT_FILTER: &str = "info,pay_invoice=debug";
const DEV_FILTER: &str = "debug,pay_invoice=trace";

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Output goes to stderr. Fails
/// if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> AppResult<()> {
    match config.format {
        LogFormat::Json => init_json(env_filter(config.filter.as_deref(), DEFAULT_FILTER)),
        LogFormat::Pretty => init_pretty(env_filter(config.filter.as_deref(), DEV_FILTER)),
    }
}

/// Initialize tracing for development (pretty printed)
pub fn init_tracing_dev() -> AppResult<()> {
    init_pretty(env_filter(None, DEV_FILTER))
}

fn env_filter(configured: Option<&str>, fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(fallback)))
        .unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn init_json(env_filter: EnvFilter) -> AppResult<()> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to install tracing subscriber: {}", e)))
}

fn init_pretty(env_filter: EnvFilter) -> AppResult<()> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to install tracing subscriber: {}", e)))
}
