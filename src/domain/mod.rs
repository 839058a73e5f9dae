//! Domain layer with picture types, errors, ports and pure services.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Pure domain services.
pub mod services;

pub use entities::{Bound, CacheKey, LoaderId, LoaderState, Picture, PictureSource};
pub use errors::PictureError;
pub use ports::{LoaderHandle, PictureLoaderPort, PictureTransportPort};
