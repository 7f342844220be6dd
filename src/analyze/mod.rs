//! Offline analysis of a finished recording: replay, detect, overlay,
//! display.

pub mod annotate;
pub mod detector;
pub mod player;

pub use detector::{FaceDetector, Region, SeetaDetector};
pub use player::{AnalysisReport, Analyzer, FileReplay, PlayerState, ReplayRead};

use crate::display::VideoDisplay;
use crate::error::Result;
use crate::DetectorConfig;

/// Replays the recording at `path` with face overlays.
///
/// The detector model loads before the file is touched: a load failure
/// reports with zero frames read. Every failure here is local to the
/// analyzer; callers decide whether to care.
pub fn analyze_recording<V: VideoDisplay>(
    path: &str,
    config: &DetectorConfig,
    display: &mut V,
) -> Result<AnalysisReport> {
    let mut detector = SeetaDetector::load(config)?;
    let mut reader = FileReplay::open(path)?;
    Analyzer::new().run(&mut reader, &mut detector, display)
}
