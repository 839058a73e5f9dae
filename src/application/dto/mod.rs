//! Data transfer objects for the application layer.

mod picture_dto;

pub use picture_dto::{FetchPictureRequest, FetchPictureResponse};
