//! # Discovery Configuration
//!
//! Operational settings shared by every service handling a request, plus the
//! scope policy. Services read it; they never persist or validate it beyond
//! presence.

use crate::errors::ConfigError;
use crate::scope::{DomainScope, ScopeFilter};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout applied by adapters to a single external call.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent presented to external sources.
pub const DEFAULT_USER_AGENT: &str = concat!("subtrace/", env!("CARGO_PKG_VERSION"));

/// Configuration carried by a request-scoped context.
#[derive(Clone)]
pub struct DiscoveryConfig {
    /// Scope policy consulted before any work is done.
    pub scope: Arc<dyn ScopeFilter>,
    /// Timeout for a single external call.
    pub http_timeout: Duration,
    /// User agent for HTTP-based sources.
    pub user_agent: String,
    /// Upper bound on names published per request (`None` = unbounded).
    pub max_names_per_request: Option<usize>,
}

impl DiscoveryConfig {
    /// Create a configuration around a scope policy with default settings.
    pub fn new(scope: Arc<dyn ScopeFilter>) -> Self {
        Self {
            scope,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_names_per_request: None,
        }
    }

    /// Convenience: check a name against the scope policy.
    pub fn is_domain_in_scope(&self, name: &str) -> bool {
        self.scope.is_in_scope(name)
    }

    /// Builder-style method to set the HTTP timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Builder-style method to set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builder-style method to cap names per request.
    #[must_use]
    pub fn with_max_names(mut self, max: usize) -> Self {
        self.max_names_per_request = Some(max);
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ST_SCOPE_DOMAINS`: comma-separated root domains (required)
    /// - `ST_SCOPE_BLACKLIST`: comma-separated excluded subdomains
    /// - `ST_HTTP_TIMEOUT_SECS`: per-call timeout (default: 30)
    /// - `ST_USER_AGENT`: user agent (default: subtrace/<version>)
    /// - `ST_MAX_NAMES`: cap on names published per request (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        let domains = env::var("ST_SCOPE_DOMAINS")
            .map_err(|_| ConfigError::Missing("ST_SCOPE_DOMAINS"))?;

        let mut scope = DomainScope::new();
        for domain in split_list(&domains) {
            scope.add_domain(domain);
        }
        if scope.domains().next().is_none() {
            return Err(ConfigError::Invalid {
                key: "ST_SCOPE_DOMAINS",
                value: domains,
            });
        }

        if let Ok(blacklist) = env::var("ST_SCOPE_BLACKLIST") {
            for name in split_list(&blacklist) {
                scope.add_blacklisted(name);
            }
        }

        let mut config = Self::new(Arc::new(scope));

        if let Some(secs) = parse_var::<u64>("ST_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Ok(agent) = env::var("ST_USER_AGENT") {
            config.user_agent = agent;
        }
        config.max_names_per_request = parse_var::<usize>("ST_MAX_NAMES")?;

        Ok(config)
    }
}

impl fmt::Debug for DiscoveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryConfig")
            .field("http_timeout", &self.http_timeout)
            .field("user_agent", &self.user_agent)
            .field("max_names_per_request", &self.max_names_per_request)
            .finish_non_exhaustive()
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(None),
    }
}
