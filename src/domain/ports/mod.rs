mod picture_loader_port;
mod picture_transport_port;

pub use picture_loader_port::{
    FailureCallback, LoadControl, LoaderHandle, PictureLoaderPort, SuccessCallback,
};
pub use picture_transport_port::{ChunkStream, PictureTransportPort};
