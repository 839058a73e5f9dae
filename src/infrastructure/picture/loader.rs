//! Per-request picture fetch state machine.
//!
//! A loader performs exactly one transfer: `Idle -> Fetching -> {Succeeded |
//! Failed | Cancelled}`. Every transition goes through one short-lived lock,
//! so a cancel racing a completion is decided by whoever takes the lock first;
//! the loser observes a terminal state and does nothing. Callbacks always run
//! outside the lock.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, trace, warn};

use crate::domain::entities::{LoaderId, LoaderState, Picture};
use crate::domain::errors::PictureError;
use crate::domain::ports::{FailureCallback, LoadControl, PictureTransportPort, SuccessCallback};

use super::cache_store::CacheStore;

struct Callbacks {
    on_success: SuccessCallback,
    on_failure: FailureCallback,
}

struct LoaderInner {
    state: LoaderState,
    callbacks: Option<Callbacks>,
    task: Option<AbortHandle>,
}

enum Outcome {
    Loaded(Picture),
    Failed(PictureError),
}

/// Fetches one picture, decodes it and writes it through to the cache.
pub struct PictureLoader {
    id: LoaderId,
    url: String,
    store: Arc<CacheStore>,
    transport: Arc<dyn PictureTransportPort>,
    runtime: Handle,
    inner: Mutex<LoaderInner>,
}

impl PictureLoader {
    /// Creates an idle loader for `url`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        store: Arc<CacheStore>,
        transport: Arc<dyn PictureTransportPort>,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: LoaderId::new(),
            url: url.into(),
            store,
            transport,
            runtime,
            inner: Mutex::new(LoaderInner {
                state: LoaderState::Idle,
                callbacks: None,
                task: None,
            }),
        })
    }

    /// Returns the loader identifier.
    #[must_use]
    pub const fn id(&self) -> LoaderId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LoaderState {
        self.inner.lock().state
    }

    /// Starts the transfer and returns without waiting for it.
    ///
    /// Exactly one of the callbacks runs later on a runtime worker, unless the
    /// loader is cancelled first.
    ///
    /// # Errors
    /// Returns `PictureError::AlreadyStarted` if the loader left `Idle`.
    pub fn start(
        self: &Arc<Self>,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) -> Result<(), PictureError> {
        {
            let mut inner = self.inner.lock();
            if inner.state != LoaderState::Idle {
                warn!(id = %self.id, state = %inner.state, "Loader already started");
                return Err(PictureError::AlreadyStarted);
            }
            inner.state = LoaderState::Fetching;
            inner.callbacks = Some(Callbacks {
                on_success,
                on_failure,
            });
        }

        debug!(id = %self.id, url = %self.url, "Starting picture fetch");

        let loader = Arc::clone(self);
        let task = self.runtime.spawn(async move {
            let outcome = loader.fetch().await;
            loader.finish(outcome);
        });

        let mut inner = self.inner.lock();
        if inner.state == LoaderState::Fetching {
            inner.task = Some(task.abort_handle());
        } else {
            // Cancelled before the task was recorded.
            task.abort();
        }
        Ok(())
    }

    /// Cancels the load. No callback runs afterwards.
    ///
    /// Idempotent: a no-op once the loader is terminal.
    pub fn cancel(&self) {
        let (callbacks, task) = {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                trace!(id = %self.id, state = %inner.state, "Cancel after terminal state ignored");
                return;
            }
            inner.state = LoaderState::Cancelled;
            (inner.callbacks.take(), inner.task.take())
        };

        if let Some(task) = task {
            task.abort();
        }
        drop(callbacks);
        debug!(id = %self.id, url = %self.url, "Cancelled picture load");
    }

    async fn fetch(&self) -> Outcome {
        let mut stream = match self.transport.open(&self.url).await {
            Ok(stream) => stream,
            Err(e) => return Outcome::Failed(e),
        };

        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    trace!(id = %self.id, len = bytes.len(), "Received chunk");
                    buffer.extend_from_slice(&bytes);
                }
                Err(e) => return Outcome::Failed(e),
            }
        }
        drop(stream);

        let bytes = Bytes::from(buffer);
        let bytes_for_decode = bytes.clone();
        let decoded =
            tokio::task::spawn_blocking(move || image::load_from_memory(&bytes_for_decode)).await;

        let picture = match decoded {
            Ok(Ok(img)) => Arc::new(img),
            Ok(Err(e)) => {
                return Outcome::Failed(PictureError::decode(format!(
                    "Failed to decode picture: {e}"
                )));
            }
            Err(e) => {
                return Outcome::Failed(PictureError::decode(format!(
                    "Decode task panicked: {e}"
                )));
            }
        };

        // A cancelled load discards what it fetched.
        if self.state() == LoaderState::Fetching
            && let Err(e) = self.store.put(&self.url, &bytes).await
        {
            debug!(id = %self.id, error = %e, "Continuing without cache write");
        }

        Outcome::Loaded(picture)
    }

    fn finish(&self, outcome: Outcome) {
        let callbacks = {
            let mut inner = self.inner.lock();
            if inner.state != LoaderState::Fetching {
                trace!(id = %self.id, state = %inner.state, "Completion after terminal state ignored");
                return;
            }
            inner.state = match &outcome {
                Outcome::Loaded(_) => LoaderState::Succeeded,
                Outcome::Failed(_) => LoaderState::Failed,
            };
            inner.task = None;
            inner.callbacks.take()
        };

        let Some(callbacks) = callbacks else {
            return;
        };

        match outcome {
            Outcome::Loaded(picture) => {
                debug!(
                    id = %self.id,
                    width = picture.width(),
                    height = picture.height(),
                    "Picture loaded from network"
                );
                (callbacks.on_success)(picture);
            }
            Outcome::Failed(e) => {
                warn!(id = %self.id, url = %self.url, error = %e, "Picture load failed");
                (callbacks.on_failure)(e);
            }
        }
    }
}

impl LoadControl for PictureLoader {
    fn state(&self) -> LoaderState {
        Self::state(self)
    }

    fn cancel(&self) {
        Self::cancel(self);
    }
}

impl std::fmt::Debug for PictureLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PictureLoader")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
