//! Error types for the discovery service crate.

use thiserror::Error;

/// Errors raised while building a request context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContextError {
    /// No discovery configuration supplied.
    #[error("request context has no configuration")]
    MissingConfig,

    /// No event bus supplied.
    #[error("request context has no event bus")]
    MissingBus,
}
