//! Domain services.

mod picture_resizer;

pub use picture_resizer::PictureResizer;
