//! # Subtrace Telemetry
//!
//! Logging setup shared by every Subtrace binary and test harness.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use subtrace_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//!
//!     // Discovery services log through `tracing` from here on
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ST_SERVICE_NAME` | `subtrace` | Service name on every log line |
//! | `ST_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `ST_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `ST_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    /// The configuration could not be applied.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging for the process.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    /// Service the guard was created for.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for creating a span with service context.
///
/// # Example
///
/// ```rust,ignore
/// use subtrace_telemetry::service_span;
///
/// async fn handle(name: &str) {
///     let _span = service_span!("on_request", service = "OpenUKArchive", name = name);
///     // ... request handling
/// }
/// ```
#[macro_export]
macro_rules! service_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
