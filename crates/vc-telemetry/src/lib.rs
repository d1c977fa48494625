//! # VC Telemetry
//!
//! Observability for the issuance pipeline.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, text or JSON lines
//! - **Metrics**: Prometheus counters, gauges and histograms in one registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VC_SERVICE_NAME` | `vc-issuer` | Service name in logs |
//! | `VC_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `VC_JSON_LOGS` | `false` | JSON log lines |
//! | `VC_METRICS_PORT` | `9100` | Prometheus scrape port |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    gather_metrics, register_metrics, HistogramTimer, DOCUMENTS_SIGNED, QUEUE_DEPTH,
    SIGNING_FAILURES, TASKS_ENQUEUED, TASKS_FAILED, TASKS_PROCESSED, TASK_DURATION,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
