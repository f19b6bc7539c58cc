//! Adapters Layer
//!
//! The closed set of source adapters a discovery service can be composed
//! with. Each variant implements the `SourceAdapter` port.

pub mod static_source;

pub use static_source::StaticSource;

use async_trait::async_trait;
use shared_types::{CancellationToken, DiscoveryConfig, SourceAdapter, SourceError};
use st_02_archive_source::ArchiveSource;

/// Source adapter selected at composition time.
#[derive(Debug, Clone)]
pub enum SourceAdapterKind {
    /// Web archive capture index.
    Archive(ArchiveSource),
    /// Fixed candidate list.
    Static(StaticSource),
}

impl SourceAdapterKind {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Archive(_) => "archive",
            Self::Static(_) => "static",
        }
    }
}

impl From<ArchiveSource> for SourceAdapterKind {
    fn from(source: ArchiveSource) -> Self {
        Self::Archive(source)
    }
}

impl From<StaticSource> for SourceAdapterKind {
    fn from(source: StaticSource) -> Self {
        Self::Static(source)
    }
}

#[async_trait]
impl SourceAdapter for SourceAdapterKind {
    async fn discover(
        &self,
        cancel: &CancellationToken,
        config: &DiscoveryConfig,
        anchor: &str,
        root_domain: &str,
    ) -> Result<Vec<String>, SourceError> {
        match self {
            Self::Archive(source) => source.discover(cancel, config, anchor, root_domain).await,
            Self::Static(source) => source.discover(cancel, config, anchor, root_domain).await,
        }
    }
}
