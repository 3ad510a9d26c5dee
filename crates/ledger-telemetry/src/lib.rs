//! # Ledger Telemetry
//!
//! Logging and metrics for Gossip-Ledger nodes.
//!
//! - **Logs**: `tracing` with an `EnvFilter` and a pretty or JSON fmt layer
//! - **Metrics**: Prometheus counters, gauges and histograms, scraped from
//!   the node's `GET /metrics` route
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GL_SERVICE_NAME` | `gossip-ledger` | Service name in logs |
//! | `GL_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` wins when set) |
//! | `GL_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `GL_JSON_LOGS` | `false` | JSON formatted logs |

#![warn(missing_docs)]

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{encode_metrics, record_ledger_size, register_metrics};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    /// A metric could not be registered or encoded
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The log filter directive is malformed
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install the tracing subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_tracing(config)
}

