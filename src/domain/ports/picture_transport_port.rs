//! Port definition for fetching picture bytes.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::domain::errors::PictureError;

/// Body of an open transfer, delivered as a stream of chunks.
pub type ChunkStream = BoxStream<'static, Result<Bytes, PictureError>>;

/// Port for fetching picture bytes from a remote source.
/// Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PictureTransportPort: Send + Sync {
    /// Opens a transfer for `url` and returns its body.
    ///
    /// Dropping the returned stream releases the underlying connection.
    async fn open(&self, url: &str) -> Result<ChunkStream, PictureError>;
}
