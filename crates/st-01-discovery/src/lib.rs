//! # ST-01 Discovery
//!
//! Discovery services: each wraps one source adapter with a scope check and
//! a per-service rate limit, and publishes every hostname it finds onto the
//! shared bus.
//!
//! ## Architecture
//!
//! - **Context** (`context`): `RequestContext` carrying configuration, bus
//!   and cancellation; missing values are a build error
//! - **Service Layer** (`service/`): `DiscoveryService` state machine and
//!   request pipeline
//! - **Adapters Layer** (`adapters/`): closed set of source adapters
//!   (`Archive`, `Static`) behind the `SourceAdapter` port
//! - **Registry** (`registry`): lifecycle and bus wiring for many services
//! - **Metrics** (`metrics`): per-service counters
//!
//! ## Events
//!
//! | Direction | Topic      | Priority | Payload                        |
//! |-----------|------------|----------|--------------------------------|
//! | in        | `request`  | any      | `DiscoveryRequest`             |
//! | out       | `new-name` | High     | `DiscoveryRequest` with source |
//! | out       | `log`      | High     | `LogMessage` on adapter error  |
//!
//! ## Invariants
//!
//! - Published names and domains are never empty
//! - An out-of-scope request never reaches the limiter or the adapter
//! - Adapter calls of one service are at least `min_interval` apart
//! - A cancelled request publishes no further names; a name already being
//!   published still reaches every subscriber
//!
//! ## Usage Example
//!
//! ```ignore
//! use st_01_discovery::{DiscoveryService, RequestContext};
//! use st_02_archive_source::ArchiveSource;
//!
//! let service = DiscoveryService::archive(ArchiveSource::open_uk_archive()?);
//! service.start().await?;
//!
//! let ctx = RequestContext::builder()
//!     .config(DiscoveryConfig::from_env()?)
//!     .bus(bus.clone())
//!     .build()?;
//!
//! let outcome = service
//!     .on_request(&ctx, DiscoveryRequest::new("www.example.com", "example.com"))
//!     .await;
//! ```

pub mod adapters;
pub mod context;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod service;

pub use adapters::{SourceAdapterKind, StaticSource};
pub use context::{RequestContext, RequestContextBuilder};
pub use error::ContextError;
pub use metrics::{DropReason, MetricsSnapshot, ServiceMetrics};
pub use registry::ServiceRegistry;
pub use service::{DiscoveryService, DiscoveryServiceBuilder, RequestOutcome, DEFAULT_MIN_INTERVAL};
