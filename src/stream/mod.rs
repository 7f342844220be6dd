pub mod frame;
pub mod sink;
pub mod source;

pub use frame::{Frame, FrameMetadata, PixelFormat};
pub use sink::{MjpegFileSink, RecordingSink};
pub use source::{StreamSource, UdpDecodeSource};
