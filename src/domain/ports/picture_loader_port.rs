//! Port definition for loading pictures with cache-first semantics.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entities::{Bound, LoaderId, LoaderState, Picture};
use crate::domain::errors::PictureError;

/// Called once with the decoded picture.
pub type SuccessCallback = Box<dyn FnOnce(Picture) + Send + 'static>;

/// Called once with the reason a load failed.
pub type FailureCallback = Box<dyn FnOnce(PictureError) + Send + 'static>;

/// Control surface of one in-flight load.
pub trait LoadControl: Send + Sync {
    /// Returns the current lifecycle state.
    fn state(&self) -> LoaderState;

    /// Cancels the load. A no-op once terminal.
    fn cancel(&self);
}

/// Caller-held reference to an in-flight load, used for cancellation.
///
/// The handle remains safe to hold after the load has finished; cancelling it
/// then has no effect.
#[derive(Clone)]
pub struct LoaderHandle {
    id: LoaderId,
    url: Arc<str>,
    control: Arc<dyn LoadControl>,
}

impl LoaderHandle {
    /// Creates a handle over a load control.
    #[must_use]
    pub fn new(id: LoaderId, url: &str, control: Arc<dyn LoadControl>) -> Self {
        Self {
            id,
            url: Arc::from(url),
            control,
        }
    }

    /// Returns the loader identifier.
    #[must_use]
    pub const fn id(&self) -> LoaderId {
        self.id
    }

    /// Returns the URL being loaded.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LoaderState {
        self.control.state()
    }

    /// Returns true once the load reached a terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    pub(crate) fn cancel(&self) {
        self.control.cancel();
    }
}

impl std::fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderHandle")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}

/// Port for loading pictures, checking the cache before the network.
#[async_trait]
pub trait PictureLoaderPort: Send + Sync {
    /// Resolves `url` to a picture.
    ///
    /// On a cache hit or a dummy-URL miss the matching callback runs before
    /// this returns and no handle is produced. Otherwise a fetch starts and
    /// its handle is returned.
    fn load_picture(
        &self,
        url: &str,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) -> Option<LoaderHandle>;

    /// Cancels a load. A no-op for `None` or finished loads.
    fn cancel(&self, handle: Option<&LoaderHandle>);

    /// Scales a picture to fit within `bound`.
    fn resize(&self, picture: &Picture, bound: Bound) -> Picture;

    /// Removes every cached picture.
    async fn clear_cache(&self) -> Result<(), PictureError>;

    /// Removes the cached picture for `url`, if any.
    async fn invalidate(&self, url: &str) -> Result<(), PictureError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use crate::domain::services::PictureResizer;

    /// How the mock responds to a load.
    #[derive(Clone)]
    pub enum MockBehavior {
        /// Serve the picture synchronously, as from cache.
        Cached(Picture),
        /// Fail synchronously.
        Fail(PictureError),
        /// Complete asynchronously with the picture.
        Deliver(Picture),
        /// Start a load that never completes.
        Hang,
        /// Start a load, then drop both callbacks unused.
        Abandon,
    }

    struct HangingLoad {
        cancelled: AtomicBool,
    }

    impl LoadControl for HangingLoad {
        fn state(&self) -> LoaderState {
            if self.cancelled.load(Ordering::SeqCst) {
                LoaderState::Cancelled
            } else {
                LoaderState::Fetching
            }
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// Mock picture loader for testing.
    pub struct MockPictureLoader {
        behavior: MockBehavior,
        cancels: AtomicUsize,
        pending: Mutex<Vec<FailureCallback>>,
    }

    impl MockPictureLoader {
        /// Creates new mock.
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                cancels: AtomicUsize::new(0),
                pending: Mutex::new(Vec::new()),
            }
        }

        /// Returns how many handles were cancelled.
        pub fn cancels(&self) -> usize {
            self.cancels.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PictureLoaderPort for MockPictureLoader {
        fn load_picture(
            &self,
            url: &str,
            on_success: SuccessCallback,
            on_failure: FailureCallback,
        ) -> Option<LoaderHandle> {
            match self.behavior.clone() {
                MockBehavior::Cached(picture) => {
                    on_success(picture);
                    None
                }
                MockBehavior::Fail(error) => {
                    on_failure(error);
                    None
                }
                MockBehavior::Deliver(picture) => {
                    tokio::spawn(async move { on_success(picture) });
                    let control = Arc::new(HangingLoad {
                        cancelled: AtomicBool::new(false),
                    });
                    Some(LoaderHandle::new(LoaderId::new(), url, control))
                }
                MockBehavior::Abandon => {
                    drop((on_success, on_failure));
                    let control = Arc::new(HangingLoad {
                        cancelled: AtomicBool::new(true),
                    });
                    Some(LoaderHandle::new(LoaderId::new(), url, control))
                }
                MockBehavior::Hang => {
                    self.pending.lock().push(on_failure);
                    let control = Arc::new(HangingLoad {
                        cancelled: AtomicBool::new(false),
                    });
                    Some(LoaderHandle::new(LoaderId::new(), url, control))
                }
            }
        }

        fn cancel(&self, handle: Option<&LoaderHandle>) {
            if let Some(handle) = handle {
                self.cancels.fetch_add(1, Ordering::SeqCst);
                handle.cancel();
            }
        }

        fn resize(&self, picture: &Picture, bound: Bound) -> Picture {
            PictureResizer::resize(picture, bound)
        }

        async fn clear_cache(&self) -> Result<(), PictureError> {
            Ok(())
        }

        async fn invalidate(&self, _url: &str) -> Result<(), PictureError> {
            Ok(())
        }
    }
}
