//! Domain error types.

mod picture_error;

pub use picture_error::PictureError;
