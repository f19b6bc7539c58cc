//! # Shared Types Crate
//!
//! This crate contains the discovery request model and every contract a
//! discovery service is built from.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Types crossing crate boundaries live here.
//! - **Ports, not implementations**: `ScopeFilter` and `SourceAdapter` are
//!   the seams; the core ships only minimal implementations.
//! - **Provenance on every result**: published requests carry the tag and
//!   display name of the service that found them.

pub mod config;
pub mod entities;
pub mod errors;
pub mod names;
pub mod rate_limiter;
pub mod scope;
pub mod service_trait;
pub mod source;

pub use config::DiscoveryConfig;
pub use entities::*;
pub use errors::*;
pub use names::clean_name;
pub use rate_limiter::MinIntervalLimiter;
pub use scope::{AllowAll, DomainScope, ScopeFilter};
pub use service_trait::{AtomicServiceState, Service, ServiceError, ServiceState, ServiceStatus};
pub use source::{with_cancellation, SourceAdapter};

// Re-exported so adapters and callers agree on the token type.
pub use tokio_util::sync::CancellationToken;
