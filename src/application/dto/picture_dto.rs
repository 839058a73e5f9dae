//! Picture fetch DTOs.

use std::time::Duration;

use crate::domain::entities::{Bound, Picture, PictureSource};

/// Picture fetch request data.
#[derive(Debug, Clone)]
pub struct FetchPictureRequest {
    /// Picture URL.
    pub url: String,
    /// Bound to resize into; unbounded by default.
    pub bound: Bound,
    /// Cancel the load if it takes longer than this.
    pub deadline: Option<Duration>,
}

impl FetchPictureRequest {
    /// Creates new fetch request.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bound: Bound::default(),
            deadline: None,
        }
    }

    /// Resizes the result to fit `bound`.
    #[must_use]
    pub const fn with_bound(mut self, bound: Bound) -> Self {
        self.bound = bound;
        self
    }

    /// Sets an overall deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Picture fetch response data.
#[derive(Debug, Clone)]
pub struct FetchPictureResponse {
    /// The (possibly resized) picture.
    pub picture: Picture,
    /// Where the picture came from.
    pub source: PictureSource,
}

impl FetchPictureResponse {
    /// Creates new response.
    #[must_use]
    pub const fn new(picture: Picture, source: PictureSource) -> Self {
        Self { picture, source }
    }
}
