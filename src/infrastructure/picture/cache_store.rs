//! Disk-backed picture cache keyed by a hash of the source URL.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{CacheKey, Picture};
use crate::domain::errors::PictureError;

use super::cache_dir::CacheDir;

/// Disk cache that persists raw picture bytes as `ima<key>.jpg` files.
///
/// Nothing is retained in memory: every read goes to disk and hands the
/// decoded picture to the caller.
#[derive(Debug)]
pub struct CacheStore {
    dir: CacheDir,
}

impl CacheStore {
    /// Creates a store over the given cache directory.
    #[must_use]
    pub const fn new(dir: CacheDir) -> Self {
        Self { dir }
    }

    /// Creates a store rooted at `root` (entries live in `root/picturecache`).
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self::new(CacheDir::new(root))
    }

    /// Derives the cache key for a URL. Pure, no I/O.
    #[must_use]
    pub fn compute_key(url: &str) -> CacheKey {
        CacheKey::from_url(url)
    }

    /// Returns the directory holding cache entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the file path for a URL's entry.
    #[must_use]
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.path().join(Self::compute_key(url).file_name())
    }

    /// Reads raw bytes for a URL from disk.
    pub fn get_bytes(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(url);
        match std::fs::read(&path) {
            Ok(bytes) => {
                trace!(url = %url, path = %path.display(), "Disk cache hit");
                Some(bytes)
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(url = %url, error = %e, "Failed to read cache entry");
                }
                trace!(url = %url, "Disk cache miss");
                None
            }
        }
    }

    /// Reads and decodes the picture for a URL.
    ///
    /// Returns `None` when there is no entry or it does not decode.
    pub fn get(&self, url: &str) -> Option<Picture> {
        let bytes = self.get_bytes(url)?;
        match image::load_from_memory(&bytes) {
            Ok(img) => {
                debug!(url = %url, "Decoded picture from disk cache");
                Some(Arc::new(img))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to decode cached picture");
                None
            }
        }
    }

    /// Stores raw bytes for a URL.
    ///
    /// The bytes land in a temporary file in the cache directory and are then
    /// renamed over the entry, so readers never see a partial write. If the
    /// directory was removed underneath the store, it is recreated and the
    /// write is retried once.
    ///
    /// # Errors
    /// Returns `PictureError::Io` if the directory or file cannot be written.
    pub async fn put(&self, url: &str, bytes: &[u8]) -> Result<(), PictureError> {
        let path = self.entry_path(url);
        let data: Arc<[u8]> = Arc::from(bytes);

        let mut result = self.write_entry(&path, &data).await?;
        if let Err(e) = &result
            && e.kind() == std::io::ErrorKind::NotFound
        {
            debug!(url = %url, path = %path.display(), "Cache dir vanished, recreating");
            self.dir.reset();
            result = self.write_entry(&path, &data).await?;
        }

        if let Err(e) = result {
            warn!(url = %url, path = %path.display(), error = %e, "Failed to write cache entry");
            return Err(PictureError::io(format!("Failed to write cache file: {e}")));
        }

        debug!(url = %url, path = %path.display(), size = bytes.len(), "Stored picture in disk cache");
        Ok(())
    }

    async fn write_entry(
        &self,
        path: &Path,
        data: &Arc<[u8]>,
    ) -> Result<std::io::Result<()>, PictureError> {
        let dir = self.dir.ensure().await?.to_path_buf();
        let target = path.to_path_buf();
        let data = Arc::clone(data);

        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &data))
            .await
            .map_err(|e| PictureError::io(format!("Cache write task panicked: {e}")))
    }

    /// Removes the entry for a URL. A missing entry is not an error.
    ///
    /// # Errors
    /// Returns `PictureError::Io` if the file exists but cannot be removed.
    pub async fn invalidate(&self, url: &str) -> Result<(), PictureError> {
        let path = self.entry_path(url);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(url = %url, "Invalidated disk cache entry");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to invalidate cache entry");
                Err(PictureError::io(format!("Failed to remove cache file: {e}")))
            }
        }
    }

    /// Deletes the whole cache directory. It is recreated on the next `put`.
    ///
    /// # Errors
    /// Returns `PictureError::Io` if the directory exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), PictureError> {
        let result = fs::remove_dir_all(self.dir.path()).await;
        self.dir.reset();
        match result {
            Ok(()) => {
                info!(path = %self.dir.path().display(), "Cleared picture cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %self.dir.path().display(), error = %e, "Failed to clear picture cache");
                Err(PictureError::io(format!("Failed to clear cache dir: {e}")))
            }
        }
    }

    /// Checks if a URL has a cache entry.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.entry_path(url).is_file()
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
    temp_file.write_all(bytes)?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
