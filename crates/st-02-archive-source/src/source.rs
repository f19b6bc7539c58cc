//! Archive source adapter.

use crate::config::ArchiveConfig;
use crate::extract::extract_hostnames;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use shared_types::{
    with_cancellation, CancellationToken, DiscoveryConfig, SourceAdapter, SourceError,
    SourceIdentity, SourceType,
};
use tracing::{debug, trace};

/// Display name of the UK Web Archive connector.
pub const DISPLAY_NAME: &str = "OpenUKArchive";

/// Queries a Wayback-style capture index for historical URLs of a host.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    config: ArchiveConfig,
    client: Client,
}

impl ArchiveSource {
    /// Create an adapter for the given archive.
    pub fn new(config: ArchiveConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .build()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Adapter for the UK Web Archive with default settings.
    pub fn open_uk_archive() -> Result<Self, SourceError> {
        Self::new(ArchiveConfig::default())
    }

    /// Identity a discovery service wrapping this adapter should carry.
    #[must_use]
    pub fn identity() -> SourceIdentity {
        SourceIdentity::new(SourceType::Archive, DISPLAY_NAME)
    }

    /// Archive settings.
    #[must_use]
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Capture index URL listing every capture of `anchor`.
    #[must_use]
    pub fn capture_index_url(&self, anchor: &str) -> String {
        format!("{}/*/{}*", self.config.base_url, anchor.trim())
    }

    async fn fetch(
        &self,
        config: &DiscoveryConfig,
        url: &str,
        root_domain: &str,
    ) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, config.user_agent.as_str())
            .timeout(config.http_timeout)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(map_http_error)?;
        trace!(url, bytes = body.len(), "Capture index fetched");

        extract_hostnames(&body, root_domain, &self.config.archive_domain)
    }
}

#[async_trait]
impl SourceAdapter for ArchiveSource {
    async fn discover(
        &self,
        cancel: &CancellationToken,
        config: &DiscoveryConfig,
        anchor: &str,
        root_domain: &str,
    ) -> Result<Vec<String>, SourceError> {
        let url = self.capture_index_url(anchor);
        debug!(%url, root_domain, "Querying archive");

        let names = with_cancellation(cancel, self.fetch(config, &url, root_domain)).await?;

        debug!(%url, found = names.len(), "Archive query complete");
        Ok(names)
    }
}

fn map_http_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::Transport(format!("connection failed: {e}"))
    } else if e.is_decode() {
        SourceError::Parse(e.to_string())
    } else {
        SourceError::Transport(e.to_string())
    }
}
