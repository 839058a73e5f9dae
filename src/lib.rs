//! Picache - cache-first picture loading for chat clients.
//!
//! Pictures are served from a flat on-disk cache keyed by URL hash, fetched
//! over HTTP on a miss, written through to disk and delivered by callback.
//! Loads are cancellable and results can be resized to a bounding box.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "picache";
