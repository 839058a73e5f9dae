//! Use case implementations.

mod fetch_picture_use_case;

pub use fetch_picture_use_case::FetchPictureUseCase;
