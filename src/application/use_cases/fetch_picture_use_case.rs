//! Fetch picture use case implementation.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::application::dto::{FetchPictureRequest, FetchPictureResponse};
use crate::domain::entities::{Picture, PictureSource};
use crate::domain::errors::PictureError;
use crate::domain::ports::PictureLoaderPort;
use crate::domain::services::PictureResizer;

type Reply = Arc<Mutex<Option<oneshot::Sender<Result<Picture, PictureError>>>>>;

/// Awaits a picture load, enforcing an optional deadline and resizing the result.
#[derive(Clone)]
pub struct FetchPictureUseCase {
    loader_port: Arc<dyn PictureLoaderPort>,
}

impl FetchPictureUseCase {
    /// Creates new fetch picture use case.
    #[must_use]
    pub const fn new(loader_port: Arc<dyn PictureLoaderPort>) -> Self {
        Self { loader_port }
    }

    /// Executes the fetch.
    ///
    /// # Errors
    /// Returns the load failure, `PictureError::DeadlineExceeded` after
    /// cancelling a load that outlived the deadline, or
    /// `PictureError::Cancelled` if the load ended without a result.
    pub async fn execute(
        &self,
        request: FetchPictureRequest,
    ) -> Result<FetchPictureResponse, PictureError> {
        debug!(url = %request.url, bound = %request.bound, "Fetching picture");

        let (tx, rx) = oneshot::channel();
        let reply: Reply = Arc::new(Mutex::new(Some(tx)));
        let success_reply = reply.clone();

        let handle = self.loader_port.load_picture(
            &request.url,
            Box::new(move |picture| send(&success_reply, Ok(picture))),
            Box::new(move |e| send(&reply, Err(e))),
        );
        let source = if handle.is_some() {
            PictureSource::Network
        } else {
            PictureSource::DiskCache
        };

        let outcome = match request.deadline {
            Some(deadline) => {
                if let Ok(outcome) = tokio::time::timeout(deadline, rx).await {
                    outcome
                } else {
                    warn!(url = %request.url, secs = deadline.as_secs(), "Picture load deadline exceeded");
                    self.loader_port.cancel(handle.as_ref());
                    return Err(PictureError::DeadlineExceeded {
                        secs: deadline.as_secs(),
                    });
                }
            }
            None => rx.await,
        };

        let picture = match outcome {
            Ok(Ok(picture)) => picture,
            Ok(Err(e)) => {
                if e.is_recoverable() {
                    warn!(url = %request.url, error = %e, network = e.is_network_error(), "Picture load failed, a retry may succeed");
                } else {
                    debug!(url = %request.url, error = %e, "Picture load failed");
                }
                return Err(e);
            }
            Err(_) => return Err(PictureError::Cancelled),
        };

        let bound = request.bound;
        let picture = tokio::task::spawn_blocking(move || PictureResizer::resize(&picture, bound))
            .await
            .map_err(|e| PictureError::decode(format!("Resize task panicked: {e}")))?;

        info!(
            url = %request.url,
            source = %source,
            width = picture.width(),
            height = picture.height(),
            "Picture ready"
        );

        Ok(FetchPictureResponse::new(picture, source))
    }
}

fn send(reply: &Reply, result: Result<Picture, PictureError>) {
    if let Some(tx) = reply.lock().take() {
        let _ = tx.send(result);
    }
}
