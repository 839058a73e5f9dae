//! Lazily created picture cache directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::domain::errors::PictureError;

/// Fixed subdirectory under the cache root holding picture entries.
pub const CACHE_SUBDIR: &str = "picturecache";

/// Cache directory created at most once per reset.
///
/// Concurrent first users wait on a single initializer; once created, callers
/// only clone the cell handle and never serialize on disk I/O.
pub struct CacheDir {
    path: PathBuf,
    created: Mutex<Arc<OnceCell<()>>>,
}

impl CacheDir {
    /// Creates a cache directory handle under `root`. Nothing touches disk yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            path: root.into().join(CACHE_SUBDIR),
            created: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    /// Returns the directory path without creating it.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the directory on first use and returns its path.
    ///
    /// # Errors
    /// Returns `PictureError::Io` if the directory cannot be created. A failed
    /// attempt is retried on the next call.
    pub async fn ensure(&self) -> Result<&Path, PictureError> {
        let cell = self.created.lock().clone();
        cell.get_or_try_init(|| async {
            tokio::fs::create_dir_all(&self.path).await.map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "Failed to create picture cache dir");
                PictureError::io(format!("Failed to create cache dir: {e}"))
            })?;
            debug!(path = %self.path.display(), "Picture cache dir ready");
            Ok::<(), PictureError>(())
        })
        .await?;
        Ok(&self.path)
    }

    /// Forgets that the directory exists so the next `ensure` recreates it.
    pub fn reset(&self) {
        *self.created.lock() = Arc::new(OnceCell::new());
    }

    /// Returns true if the directory was created since the last reset.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.created.lock().initialized()
    }
}

impl std::fmt::Debug for CacheDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheDir")
            .field("path", &self.path)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
