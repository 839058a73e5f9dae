//! Domain entities.

mod picture;

pub use picture::{
    Bound, CacheKey, DUMMY_URL_PREFIX, LoaderId, LoaderState, Picture, PictureSource, is_dummy_url,
};
