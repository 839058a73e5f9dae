//! Infrastructure layer with filesystem, network and configuration adapters.

/// Application configuration.
pub mod config;
/// Picture cache, loaders and HTTP transport.
pub mod picture;

pub use config::{AppConfig, CacheConfig, CliArgs, Command, LogLevel, StorageManager};
pub use picture::{
    CacheDir, CacheStore, HttpPictureTransport, PictureLoader, PictureManager,
};
