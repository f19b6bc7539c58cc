//! # Source Adapter Port
//!
//! The pluggable unit that performs the actual external lookup for a
//! discovery service.
//!
//! Adapters must:
//! - return promptly with `SourceError::Cancelled` once `cancel` fires;
//! - return `Ok(vec![])` when nothing was found (not an error);
//! - leave scope checks and rate limiting to the calling service.

use crate::config::DiscoveryConfig;
use crate::errors::SourceError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Driven port implemented by every data source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Look up hostnames related to `anchor` under `root_domain`.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Request-scoped cancellation
    /// * `config` - Operational settings (timeouts, user agent)
    /// * `anchor` - Host to search around
    /// * `root_domain` - Domain under evaluation
    async fn discover(
        &self,
        cancel: &CancellationToken,
        config: &DiscoveryConfig,
        anchor: &str,
        root_domain: &str,
    ) -> Result<Vec<String>, SourceError>;
}

/// Race `fut` against `cancel`, mapping cancellation to `SourceError::Cancelled`.
///
/// Cancellation wins ties so an already-cancelled token never starts work.
pub async fn with_cancellation<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, SourceError>
where
    F: std::future::Future<Output = Result<T, SourceError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SourceError::Cancelled),
        result = fut => result,
    }
}
