//! HTTP picture transport.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::domain::errors::PictureError;
use crate::domain::ports::{ChunkStream, PictureTransportPort};

const USER_AGENT: &str = concat!("picache/", env!("CARGO_PKG_VERSION"));

/// Streams picture bodies over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpPictureTransport {
    client: Client,
}

impl HttpPictureTransport {
    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(timeout: Duration) -> Result<Self, PictureError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PictureError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PictureTransportPort for HttpPictureTransport {
    async fn open(&self, url: &str) -> Result<ChunkStream, PictureError> {
        debug!(url = %url, "Requesting picture");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Picture request failed");
            if e.is_timeout() {
                PictureError::transport("request timed out")
            } else if e.is_connect() {
                PictureError::transport(format!("failed to connect: {e}"))
            } else {
                PictureError::transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PictureError::transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| PictureError::transport(format!("Failed to read body: {e}")))
        });

        Ok(body.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::CacheConfig;

    #[test]
    fn test_transport_creation() {
        assert!(HttpPictureTransport::new(CacheConfig::default().request_timeout()).is_ok());
        assert!(HttpPictureTransport::new(Duration::from_millis(250)).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let transport = HttpPictureTransport::new(Duration::from_secs(5)).unwrap();

        let result = transport.open("not a url").await;

        assert!(matches!(result, Err(PictureError::Transport { .. })));
    }
}
