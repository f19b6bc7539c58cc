//! # Core Domain Entities
//!
//! Defines the values that flow between discovery services and the bus.
//!
//! ## Clusters
//!
//! - **Requests**: `DiscoveryRequest`, the unit of work and of output
//! - **Provenance**: `SourceType`, `SourceIdentity`
//! - **Diagnostics**: `LogMessage`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: PROVENANCE
// =============================================================================

/// Category of the data source that produced a name.
///
/// Rendered lowercase on the wire and in `tag` fields (`"archive"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Name came from DNS resolution.
    Dns,
    /// Web archive captures.
    Archive,
    /// Third-party API.
    Api,
    /// Certificate transparency / certificate data.
    Cert,
    /// Scraped search or web pages.
    Scrape,
    /// Brute forcing.
    Brute,
    /// Name alterations.
    Alt,
    /// Zone transfers.
    Axfr,
    /// External tooling.
    External,
    /// Regional internet registries.
    Rir,
}

impl SourceType {
    /// Lowercase label used as the request tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Archive => "archive",
            Self::Api => "api",
            Self::Cert => "cert",
            Self::Scrape => "scrape",
            Self::Brute => "brute",
            Self::Alt => "alt",
            Self::Axfr => "axfr",
            Self::External => "external",
            Self::Rir => "rir",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a discovery service, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceIdentity {
    /// Category label attached to every published name.
    pub source_type: SourceType,
    /// Human-readable name, also used as the `source` of published names.
    pub display_name: String,
}

impl SourceIdentity {
    /// Create a new identity.
    pub fn new(source_type: SourceType, display_name: impl Into<String>) -> Self {
        Self {
            source_type,
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

// =============================================================================
// CLUSTER B: REQUESTS
// =============================================================================

/// A hostname under evaluation for a root domain.
///
/// Inbound, `name` is the anchor host a service should search around and
/// may be empty when nothing is known yet. Published as a result, both
/// `name` and `domain` are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DiscoveryRequest {
    /// Hostname (may be empty for inbound requests).
    pub name: String,
    /// Root domain under evaluation.
    pub domain: String,
    /// Provenance label.
    pub tag: Option<SourceType>,
    /// Identifier of the service that produced this request.
    pub source: String,
}

impl DiscoveryRequest {
    /// Create an inbound request without provenance.
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            tag: None,
            source: String::new(),
        }
    }

    /// Attach provenance from a service identity.
    #[must_use]
    pub fn tagged(mut self, identity: &SourceIdentity) -> Self {
        self.tag = Some(identity.source_type);
        self.source = identity.display_name.clone();
        self
    }

    /// True when both `name` and `domain` are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.domain.is_empty()
    }
}

// =============================================================================
// CLUSTER C: DIAGNOSTICS
// =============================================================================

/// Human-readable diagnostic tagged with the emitting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Display name of the emitting service.
    pub source: String,
    /// Description of what happened.
    pub message: String,
}

impl LogMessage {
    /// Create a new log message.
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}
