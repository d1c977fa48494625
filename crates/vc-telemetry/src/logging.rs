//! Structured logging.
//!
//! Human-readable output by default; JSON lines when `json_logs` is set, so a
//! log shipper can parse `level`, `target`, `fields.queue`,
//! `fields.transaction_id` and friends without regexes.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::{TelemetryConfig, TelemetryError};

/// Build the filter from the configured directive, falling back to `info`
/// when the directive does not parse.
pub fn env_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config);

    let result = if config.json_logs {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init()
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "[telemetry] Logging initialized"
    );
    Ok(())
}
