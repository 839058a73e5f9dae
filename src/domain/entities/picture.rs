//! Domain types for picture loading and caching.

use std::sync::Arc;

/// Reserved URL prefix marking a local placeholder with no network representation.
pub const DUMMY_URL_PREFIX: &str = "dummyUrl";

/// A decoded picture, shared between the cache, loaders and callers.
pub type Picture = Arc<image::DynamicImage>;

/// Returns true if the URL is a dummy placeholder that must never be fetched.
#[must_use]
pub fn is_dummy_url(url: &str) -> bool {
    url.starts_with(DUMMY_URL_PREFIX)
}

/// Deterministic cache key derived from a source URL.
///
/// The key is the first 16 bytes of the SHA-256 digest of the raw URL string,
/// hex encoded. URLs are not normalized and collisions are not detected, so two
/// distinct URLs with the same truncated digest would share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a URL.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the on-disk file name for this key.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("ima{}.jpg", self.0)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum width and height a resized picture may occupy.
///
/// A zero on either side means "unbounded" and disables resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bound {
    /// Maximum width in pixels.
    pub width: u32,
    /// Maximum height in pixels.
    pub height: u32,
}

impl Bound {
    /// Creates a new bound.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if this bound disables resizing.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Lifecycle of a single picture load.
///
/// `Idle -> Fetching -> {Succeeded | Failed | Cancelled}`. Terminal states are
/// irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderState {
    /// Created but not started.
    #[default]
    Idle,
    /// Transfer in progress.
    Fetching,
    /// Picture decoded and delivered.
    Succeeded,
    /// Transfer or decode failed.
    Failed,
    /// Cancelled by the caller.
    Cancelled,
}

impl LoaderState {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for LoaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Unique identifier of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoaderId(uuid::Uuid);

impl LoaderId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for LoaderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LoaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a picture was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureSource {
    /// Read from the disk cache.
    DiskCache,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for PictureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiskCache => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}
