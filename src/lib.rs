pub mod analyze;
pub mod display;
pub mod error;
pub mod flight;
pub mod record;
pub mod session;
pub mod stream;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

use flight::CommandPolicy;

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub flight: FlightConfig,
    pub stream: StreamConfig,
    pub recording: RecordingConfig,
    pub detector: DetectorConfig,
    pub session: SessionConfig,
}

/// Command link to the vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightConfig {
    /// Command endpoint of the vehicle's access point.
    pub command_addr: String,
    /// How long a command waits for its ack before failing.
    pub command_timeout: Duration,
    /// Out-and-back maneuver distance in centimeters.
    pub maneuver_distance_cm: u32,
}

/// Live video transport and decode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Transport descriptor handed to the decoder.
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Frame channel depth. Deeper buffers resist drops under jitter at the
    /// cost of staleness.
    pub buffer_depth: usize,
    /// Per-pull block limit in the capture-record loop.
    pub pull_timeout: Duration,
    /// How long the open waits for the first decoded frame.
    pub open_timeout: Duration,
}

/// Output file settings for the recording sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    pub path: String,
    /// Fixed target frame rate of the container.
    pub fps: u32,
}

/// Sensitivity knobs for the face detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub model_path: String,
    /// Smallest face the pyramid search will consider, in pixels.
    pub min_face_size: u32,
    /// Detection score cutoff; higher trades recall for fewer false hits.
    pub score_thresh: f64,
    /// Pyramid downscale factor for the multi-scale search.
    pub pyramid_scale_factor: f32,
    /// Sliding window stride in pixels.
    pub window_step: u32,
}

/// Session-level choreography settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Wall-clock recording window, measured from the loop's own start.
    pub record_duration: Duration,
    /// What the sequencer does when a flight command fails.
    pub command_policy: CommandPolicy,
    /// Pause before the first command so the vehicle's AP can settle.
    pub settle_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flight: FlightConfig {
                command_addr: "192.168.10.1:8889".into(),
                command_timeout: Duration::from_secs(10),
                maneuver_distance_cm: 90,
            },
            stream: StreamConfig {
                url: "udp://0.0.0.0:11111?overrun_nonfatal=1&fifo_size=580000".into(),
                width: 960,
                height: 720,
                fps: 30,
                buffer_depth: 10,
                pull_timeout: Duration::from_secs(1),
                open_timeout: Duration::from_secs(5),
            },
            recording: RecordingConfig {
                path: "output_video.avi".into(),
                fps: 30,
            },
            detector: DetectorConfig {
                model_path: "seeta_fd_frontal_v1.0.bin".into(),
                min_face_size: 20,
                score_thresh: 2.0,
                pyramid_scale_factor: 0.8,
                window_step: 4,
            },
            session: SessionConfig {
                record_duration: Duration::from_secs(20),
                command_policy: CommandPolicy::AbortAndLand,
                settle_delay: Duration::from_secs(5),
            },
        }
    }
}
