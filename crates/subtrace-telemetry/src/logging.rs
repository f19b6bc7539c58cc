//! Structured logging setup.
//!
//! Human-readable output for development, JSON lines for containers:
//! - `timestamp`, `level`, `target`
//! - span fields (`service`, `domain`, ...)
//! - event fields and message

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber described by `config`.
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level {:?}: {e}", config.log_level)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match (config.console_output, config.json_logs) {
        (false, _) => registry.try_init(),
        (true, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        (true, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

/// Log a service event with the standard `service` field.
#[macro_export]
macro_rules! log_event {
    ($level:ident, $service:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            service = %$service,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a discovery request event with standard fields.
#[macro_export]
macro_rules! log_request_event {
    ($level:ident, $service:expr, $msg:expr, $name:expr, $domain:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            service = %$service,
            name = %$name,
            domain = %$domain,
            $($($field)*,)?
            $msg
        )
    };
}
