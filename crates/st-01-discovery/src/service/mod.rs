//! Service Layer
//!
//! Contains the discovery service that orchestrates scope checks, rate
//! limiting and the source adapter, publishing results on the bus.

pub mod discovery_service;

pub use discovery_service::{
    DiscoveryService, DiscoveryServiceBuilder, RequestOutcome, DEFAULT_MIN_INTERVAL,
    DEGRADED_AFTER_FAILURES,
};
