use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Frame data with zero-copy semantics
#[derive(Clone)]
pub struct Frame {
    /// Immutable pixel data - can be shared across threads without copying
    pub data: Bytes,

    /// Frame metadata
    pub meta: Arc<FrameMetadata>,

    /// Arrival timestamp
    pub timestamp: Instant,
}

/// Frame metadata
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    /// Arrival order, counted from 1 by the producer.
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// Pixel formats the decode stage produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
        }
    }
}

impl Frame {
    /// A frame with no payload is malformed; the capture-record loop treats
    /// it as an acquisition failure.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn geometry(&self) -> (u32, u32) {
        (self.meta.width, self.meta.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_flagged() {
        let meta = Arc::new(FrameMetadata {
            sequence: 1,
            width: 4,
            height: 4,
            format: PixelFormat::Rgb24,
        });
        let empty = Frame {
            data: Bytes::new(),
            meta: meta.clone(),
            timestamp: Instant::now(),
        };
        let full = Frame {
            data: Bytes::from(vec![0u8; 4 * 4 * 3]),
            meta,
            timestamp: Instant::now(),
        };
        assert!(empty.is_empty());
        assert!(!full.is_empty());
        assert_eq!(full.geometry(), (4, 4));
    }
}
