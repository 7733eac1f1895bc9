mod adapter;
mod backend;
mod backends;
mod result;

pub use adapter::detect_frame;
pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use result::{BoundingBox, Detection, ModelDetection};
