//! # Error Types
//!
//! Defines error types used across crates.

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("Invalid configuration: {key}={value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Errors raised by a source adapter.
///
/// Cancellation is its own kind so callers can tell an aborted request from
/// a failing source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The request context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The source did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// The source answered with a non-success status.
    #[error("unexpected HTTP status {status}")]
    Http { status: u16 },

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// The source cannot serve requests (misconfigured, disabled).
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// True when the error reports cancellation rather than a data failure.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
