//! Cache-first picture loading facade.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, error};

use crate::domain::entities::{Bound, LoaderId, Picture, is_dummy_url};
use crate::domain::errors::PictureError;
use crate::domain::ports::{
    FailureCallback, LoaderHandle, PictureLoaderPort, PictureTransportPort, SuccessCallback,
};
use crate::domain::services::PictureResizer;

use super::cache_store::CacheStore;
use super::http_transport::HttpPictureTransport;
use super::loader::PictureLoader;

/// Resolves pictures from the disk cache, falling back to cancellable fetches.
pub struct PictureManager {
    store: Arc<CacheStore>,
    transport: Arc<dyn PictureTransportPort>,
    runtime: Handle,
    active: Mutex<HashMap<LoaderId, LoaderHandle>>,
}

impl PictureManager {
    /// Creates a manager on the current tokio runtime.
    ///
    /// # Errors
    /// Returns `PictureError::NoRuntime` when called outside a runtime.
    pub fn new(
        store: Arc<CacheStore>,
        transport: Arc<dyn PictureTransportPort>,
    ) -> Result<Self, PictureError> {
        let runtime = Handle::try_current().map_err(|e| PictureError::NoRuntime {
            message: e.to_string(),
        })?;

        Ok(Self {
            store,
            transport,
            runtime,
            active: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a manager with an HTTP transport and a cache under `root`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built or no runtime is running.
    pub fn with_http(
        root: impl Into<std::path::PathBuf>,
        timeout: Duration,
    ) -> Result<Self, PictureError> {
        let store = Arc::new(CacheStore::at(root));
        let transport = Arc::new(HttpPictureTransport::new(timeout)?);
        Self::new(store, transport)
    }

    /// Returns the underlying cache store, e.g. to pre-seed entries.
    #[must_use]
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Returns the number of loads still in flight.
    pub fn pending_count(&self) -> usize {
        let mut active = self.active.lock();
        active.retain(|_, handle| !handle.is_finished());
        active.len()
    }

    /// Cancels every load still in flight.
    pub fn cancel_all(&self) {
        let handles: Vec<LoaderHandle> = self.active.lock().drain().map(|(_, h)| h).collect();
        let count = handles.iter().filter(|h| !h.is_finished()).count();
        for handle in &handles {
            handle.cancel();
        }
        if count > 0 {
            debug!(count = count, "Cancelled all pending picture loads");
        }
    }

    fn register(&self, handle: LoaderHandle) {
        let mut active = self.active.lock();
        active.retain(|_, h| !h.is_finished());
        active.insert(handle.id(), handle);
    }
}

#[async_trait]
impl PictureLoaderPort for PictureManager {
    fn load_picture(
        &self,
        url: &str,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) -> Option<LoaderHandle> {
        if let Some(picture) = self.store.get(url) {
            debug!(url = %url, "Serving picture from disk cache");
            on_success(picture);
            return None;
        }

        if is_dummy_url(url) {
            debug!(url = %url, "Placeholder picture missing from cache");
            on_failure(PictureError::not_available(url));
            return None;
        }

        let loader = PictureLoader::new(
            url,
            self.store.clone(),
            self.transport.clone(),
            self.runtime.clone(),
        );
        if let Err(e) = loader.start(on_success, on_failure) {
            error!(id = %loader.id(), error = %e, "Fresh loader refused to start");
            return None;
        }

        let handle = LoaderHandle::new(loader.id(), url, loader);
        self.register(handle.clone());
        Some(handle)
    }

    fn cancel(&self, handle: Option<&LoaderHandle>) {
        let Some(handle) = handle else {
            return;
        };
        debug!(id = %handle.id(), url = %handle.url(), "Cancelling picture load");
        handle.cancel();
        self.active.lock().remove(&handle.id());
    }

    fn resize(&self, picture: &Picture, bound: Bound) -> Picture {
        PictureResizer::resize(picture, bound)
    }

    async fn clear_cache(&self) -> Result<(), PictureError> {
        self.store.clear().await
    }

    async fn invalidate(&self, url: &str) -> Result<(), PictureError> {
        self.store.invalidate(url).await
    }
}

impl std::fmt::Debug for PictureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PictureManager")
            .field("store", &self.store)
            .field("active", &self.active.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::StreamExt;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    use crate::domain::entities::LoaderState;
    use crate::domain::ports::mocks::{ChannelTransport, MockPictureTransportPort, png_bytes};

    type Event = Result<(u32, u32), PictureError>;

    struct Recorder {
        rx: mpsc::UnboundedReceiver<Event>,
        calls: Arc<AtomicUsize>,
    }

    fn callbacks() -> (SuccessCallback, FailureCallback, Recorder) {
        let (tx, rx) = mpsc::unbounded_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let (fail_tx, ok_calls, fail_calls) = (tx.clone(), calls.clone(), calls.clone());
        let on_success: SuccessCallback = Box::new(move |p: Picture| {
            ok_calls.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(Ok((p.width(), p.height())));
        });
        let on_failure: FailureCallback = Box::new(move |e| {
            fail_calls.fetch_add(1, Ordering::SeqCst);
            let _ = fail_tx.send(Err(e));
        });
        (on_success, on_failure, Recorder { rx, calls })
    }

    fn untouched_transport() -> Arc<MockPictureTransportPort> {
        let mut transport = MockPictureTransportPort::new();
        transport.expect_open().never();
        Arc::new(transport)
    }

    #[tokio::test]
    async fn test_cold_then_warm_load() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        let (transport, feed) = ChannelTransport::new();
        let transport = Arc::new(transport);
        let manager = PictureManager::new(store.clone(), transport.clone()).unwrap();
        let url = "http://host/a.png";

        let (ok, err, mut recorder) = callbacks();
        let handle = manager.load_picture(url, ok, err);
        assert!(handle.is_some());

        feed.chunk(png_bytes(30, 20));
        feed.finish();

        assert_eq!(recorder.rx.recv().await.unwrap().unwrap(), (30, 20));
        assert!(recorder.rx.recv().await.is_none());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        assert!(store.contains(url));
        assert_eq!(transport.opens(), 1);
        assert_eq!(handle.unwrap().state(), LoaderState::Succeeded);

        let (ok, err, mut recorder) = callbacks();
        let handle = manager.load_picture(url, ok, err);
        assert!(handle.is_none());
        // Delivered before load_picture returned.
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.rx.try_recv().unwrap().unwrap(), (30, 20));
        assert_eq!(transport.opens(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_is_synchronous_without_network() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        store.put("http://host/b.png", &png_bytes(8, 8)).await.unwrap();
        let manager = PictureManager::new(store, untouched_transport()).unwrap();

        let (ok, err, mut recorder) = callbacks();
        let handle = manager.load_picture("http://host/b.png", ok, err);

        assert!(handle.is_none());
        assert_eq!(recorder.rx.try_recv().unwrap().unwrap(), (8, 8));
    }

    #[tokio::test]
    async fn test_dummy_url_miss_fails_synchronously() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        let manager = PictureManager::new(store, untouched_transport()).unwrap();

        let (ok, err, mut recorder) = callbacks();
        let handle = manager.load_picture("dummyUrl-placeholder", ok, err);

        assert!(handle.is_none());
        assert!(matches!(
            recorder.rx.try_recv().unwrap(),
            Err(PictureError::NotAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_seeded_dummy_url_is_served() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        store
            .put("dummyUrl-avatar", &png_bytes(16, 16))
            .await
            .unwrap();
        let manager = PictureManager::new(store, untouched_transport()).unwrap();

        let (ok, err, mut recorder) = callbacks();
        assert!(manager.load_picture("dummyUrl-avatar", ok, err).is_none());
        assert_eq!(recorder.rx.try_recv().unwrap().unwrap(), (16, 16));
    }

    #[tokio::test]
    async fn test_cancel_then_complete_fires_nothing() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        let (transport, feed) = ChannelTransport::new();
        let manager = PictureManager::new(store.clone(), Arc::new(transport)).unwrap();

        let (ok, err, mut recorder) = callbacks();
        let handle = manager.load_picture("http://host/c.png", ok, err);
        manager.cancel(handle.as_ref());

        feed.chunk(png_bytes(4, 4));
        feed.finish();

        assert!(recorder.rx.recv().await.is_none());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(handle.unwrap().state(), LoaderState::Cancelled);
        assert!(!store.contains("http://host/c.png"));
    }

    #[tokio::test]
    async fn test_cancel_none_and_repeated_cancel() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        let (transport, _feed) = ChannelTransport::new();
        let manager = PictureManager::new(store, Arc::new(transport)).unwrap();

        manager.cancel(None);

        let (ok, err, _recorder) = callbacks();
        let handle = manager.load_picture("http://host/d.png", ok, err);
        assert_eq!(handle.as_ref().unwrap().url(), "http://host/d.png");
        manager.cancel(handle.as_ref());
        manager.cancel(handle.as_ref());
        assert_eq!(handle.unwrap().state(), LoaderState::Cancelled);
    }

    #[tokio::test]
    async fn test_pending_and_cancel_all() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        let mut transport = MockPictureTransportPort::new();
        transport
            .expect_open()
            .times(0..=2)
            .returning(|_| Ok(futures_util::stream::pending().boxed()));
        let manager = PictureManager::new(store, Arc::new(transport)).unwrap();

        let (ok1, err1, _r1) = callbacks();
        let (ok2, err2, _r2) = callbacks();
        let h1 = manager.load_picture("http://host/1.png", ok1, err1).unwrap();
        let h2 = manager.load_picture("http://host/2.png", ok2, err2).unwrap();
        assert_ne!(h1.id(), h2.id());
        assert_eq!(manager.pending_count(), 2);

        manager.cancel_all();

        assert_eq!(manager.pending_count(), 0);
        assert_eq!(h1.state(), LoaderState::Cancelled);
        assert_eq!(h2.state(), LoaderState::Cancelled);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        store.put("http://host/e.png", &png_bytes(8, 8)).await.unwrap();
        let (transport, _feed) = ChannelTransport::new();
        let manager = PictureManager::new(store.clone(), Arc::new(transport)).unwrap();

        manager.clear_cache().await.unwrap();

        assert!(store.get("http://host/e.png").is_none());
        let (ok, err, _recorder) = callbacks();
        let handle = manager.load_picture("http://host/e.png", ok, err);
        assert!(handle.is_some());
        manager.cancel(handle.as_ref());
    }

    #[tokio::test]
    async fn test_invalidate_single_entry() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        store.put("http://host/f.png", &png_bytes(8, 8)).await.unwrap();
        store.put("http://host/g.png", &png_bytes(8, 8)).await.unwrap();
        let manager = PictureManager::new(store.clone(), untouched_transport()).unwrap();

        manager.invalidate("http://host/f.png").await.unwrap();
        manager.invalidate("http://host/missing.png").await.unwrap();

        assert!(!store.contains("http://host/f.png"));
        assert!(store.contains("http://host/g.png"));
    }

    #[tokio::test]
    async fn test_resize_through_facade() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        let manager = PictureManager::new(store, untouched_transport()).unwrap();
        let picture: Picture = Arc::new(image::DynamicImage::new_rgb8(4000, 3000));

        let resized = manager.resize(&picture, Bound::new(200, 200));
        assert_eq!((resized.width(), resized.height()), (200, 150));

        let same = manager.resize(&picture, Bound::new(0, 0));
        assert!(Arc::ptr_eq(&picture, &same));
    }

    #[test]
    fn test_requires_runtime() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::at(temp.path()));
        let (transport, _feed) = ChannelTransport::new();

        let result = PictureManager::new(store, Arc::new(transport));

        assert!(matches!(result, Err(PictureError::NoRuntime { .. })));
    }
}
