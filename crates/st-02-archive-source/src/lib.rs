//! # ST-02 Archive Source
//!
//! Source adapter querying a web archive's capture index for historical
//! URLs of a host and extracting the hostnames found there.
//!
//! ## Flow
//!
//! ```text
//! discover(anchor, root) ──GET {base_url}/*/{anchor}*──→ archive
//!                        ←──────── HTML capture index ──┘
//!        └──→ hostnames under `root` (lowercase, deduplicated)
//! ```
//!
//! The adapter does no scope checks and no rate limiting; the discovery
//! service wrapping it owns both.
//!
//! ## Usage
//!
//! ```ignore
//! use st_02_archive_source::ArchiveSource;
//!
//! let source = ArchiveSource::open_uk_archive()?;
//! let names = source.discover(&cancel, &config, "www.example.com", "example.com").await?;
//! ```

pub mod config;
pub mod extract;
pub mod source;

pub use config::{ArchiveConfig, DEFAULT_ARCHIVE_DOMAIN, DEFAULT_BASE_URL};
pub use extract::extract_hostnames;
pub use source::{ArchiveSource, DISPLAY_NAME};
