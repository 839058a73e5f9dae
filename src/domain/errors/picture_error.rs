//! Picture loading error types.

use thiserror::Error;

/// Picture loading and caching error variants.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum PictureError {
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("failed to decode picture: {message}")]
    Decode { message: String },

    #[error("picture not available: {url}")]
    NotAvailable { url: String },

    #[error("picture cache io error: {message}")]
    Io { message: String },

    #[error("loader already started")]
    AlreadyStarted,

    #[error("no async runtime available: {message}")]
    NoRuntime { message: String },

    #[error("picture load exceeded deadline of {secs}s")]
    DeadlineExceeded { secs: u64 },

    #[error("picture load was cancelled")]
    Cancelled,
}

impl PictureError {
    /// Creates transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates not-available error for a dummy URL.
    #[must_use]
    pub fn not_available(url: impl Into<String>) -> Self {
        Self::NotAvailable { url: url.into() }
    }

    /// Creates cache io error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Returns whether the caller may reasonably retry the load.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Io { .. } | Self::DeadlineExceeded { .. }
        )
    }

    /// Returns whether error is network related.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::DeadlineExceeded { .. })
    }
}
