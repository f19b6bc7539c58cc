//! Archive adapter configuration.

use shared_types::ConfigError;
use std::env;

/// Default capture index root.
pub const DEFAULT_BASE_URL: &str = "http://www.webarchive.org.uk/wayback/archive";

/// Host of the archive itself; its own names are never reported.
pub const DEFAULT_ARCHIVE_DOMAIN: &str = "webarchive.org.uk";

/// Settings for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Capture index root, without trailing slash.
    pub base_url: String,
    /// Domain of the archive site.
    pub archive_domain: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            archive_domain: DEFAULT_ARCHIVE_DOMAIN.to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ST_ARCHIVE_BASE_URL`: Capture index root (default: the UK Web Archive)
    /// - `ST_ARCHIVE_DOMAIN`: Archive site domain (default: webarchive.org.uk)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("ST_ARCHIVE_BASE_URL") {
            config = config.with_base_url(&url)?;
        }
        if let Some(domain) = lookup("ST_ARCHIVE_DOMAIN") {
            let domain = domain.trim().trim_end_matches('.').to_lowercase();
            if domain.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "ST_ARCHIVE_DOMAIN",
                    value: domain,
                });
            }
            config.archive_domain = domain;
        }

        Ok(config)
    }

    /// Replace the capture index root. Must be an http(s) URL.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "ST_ARCHIVE_BASE_URL",
                value: url.to_string(),
            });
        }
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(self)
    }
}
