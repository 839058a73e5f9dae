//! Picture loading infrastructure.
//!
//! This module provides:
//! - Disk caching keyed by URL hash
//! - A per-request fetch state machine
//! - An HTTP transport
//! - The cache-first loading facade

pub mod cache_dir;
pub mod cache_store;
pub mod http_transport;
pub mod loader;
pub mod manager;

pub use cache_dir::{CACHE_SUBDIR, CacheDir};
pub use cache_store::CacheStore;
pub use http_transport::HttpPictureTransport;
pub use loader::PictureLoader;
pub use manager::PictureManager;
