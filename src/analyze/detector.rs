//! Face detection behind a trait so the replay logic stays testable.

use rustface::ImageData;
use tracing::info;

use crate::error::{Error, Result};
use crate::stream::Frame;
use crate::DetectorConfig;

/// Axis-aligned detection region in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Black-box region detector. Results are transient; they exist to be drawn
/// and dropped.
pub trait FaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>>;
}

/// SeetaFace frontal-face detector loaded from a model file on disk.
pub struct SeetaDetector {
    inner: Box<dyn rustface::Detector>,
}

impl SeetaDetector {
    /// Loads the backing model and applies the sensitivity knobs. A missing
    /// or corrupt model is fatal to the analyzer that wanted it, not to the
    /// rest of the program.
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        let mut inner =
            rustface::create_detector(&config.model_path).map_err(|err| Error::ModelLoad {
                path: config.model_path.clone(),
                reason: err.to_string(),
            })?;
        inner.set_min_face_size(config.min_face_size);
        inner.set_score_thresh(config.score_thresh);
        inner.set_pyramid_scale_factor(config.pyramid_scale_factor);
        inner.set_slide_window_step(config.window_step, config.window_step);
        info!(model = %config.model_path, "detector model loaded");
        Ok(Self { inner })
    }
}

impl FaceDetector for SeetaDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>> {
        let (width, height) = frame.geometry();
        let gray = rgb_to_luma(&frame.data);
        if gray.len() != (width * height) as usize {
            return Err(Error::Acquisition(format!(
                "frame #{} payload does not match its geometry",
                frame.meta.sequence
            )));
        }

        let mut image = ImageData::new(&gray, width, height);
        let faces = self.inner.detect(&mut image);

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Region {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                }
            })
            .collect())
    }
}

/// ITU-R BT.601 luma, integer approximation. The detector consumes a single
/// gray plane.
fn rgb_to_luma(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|px| ((u32::from(px[0]) * 77 + u32::from(px[1]) * 150 + u32::from(px[2]) * 29) >> 8) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_a_model_load_error() {
        let config = DetectorConfig {
            model_path: "/nonexistent/model.bin".into(),
            ..crate::Config::default().detector
        };
        let err = SeetaDetector::load(&config).unwrap_err();
        assert!(matches!(err, Error::ModelLoad { .. }));
    }

    #[test]
    fn luma_keeps_one_byte_per_pixel() {
        let rgb = vec![255u8; 6 * 3];
        let gray = rgb_to_luma(&rgb);
        assert_eq!(gray.len(), 6);
        // White stays near white, black stays black.
        assert!(gray.iter().all(|&y| y >= 250));
        assert_eq!(rgb_to_luma(&[0, 0, 0]), [0]);
    }
}
