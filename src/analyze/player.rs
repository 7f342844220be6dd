//! Sequential replay of a finished recording with per-frame detection.

use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::info;

use crate::display::VideoDisplay;
use crate::error::{Error, Result};
use crate::stream::{Frame, FrameMetadata, PixelFormat};

use super::annotate::draw_regions;
use super::detector::FaceDetector;

/// Read-only, in-order replay of a recording. `None` is end-of-stream.
pub trait ReplayRead {
    fn next(&mut self) -> Result<Option<Frame>>;
}

/// Playback state of the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Playing,
    Finished,
}

/// What a replay pass saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisReport {
    pub frames_scanned: u64,
    pub regions_found: u64,
}

/// Drives one recording through detect → overlay → present.
#[derive(Default)]
pub struct Analyzer {
    state: PlayerState,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            state: PlayerState::Idle,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Replays every frame in order. End-of-stream finishes playback; so
    /// does a close request from the display, which is advisory and may be
    /// dismissed at any time.
    pub fn run<R, D, V>(
        &mut self,
        reader: &mut R,
        detector: &mut D,
        display: &mut V,
    ) -> Result<AnalysisReport>
    where
        R: ReplayRead,
        D: FaceDetector,
        V: VideoDisplay,
    {
        let mut report = AnalysisReport::default();
        self.state = PlayerState::Playing;

        loop {
            let Some(frame) = reader.next()? else {
                break;
            };

            let regions = detector.detect(&frame)?;
            report.frames_scanned += 1;
            report.regions_found += regions.len() as u64;

            let (width, height) = frame.geometry();
            let mut pixels = frame.data.to_vec();
            draw_regions(&mut pixels, width, height, &regions);
            if !display.present(&pixels, width, height)? {
                info!("display closed, stopping replay early");
                break;
            }
        }

        self.state = PlayerState::Finished;
        info!(
            frames = report.frames_scanned,
            regions = report.regions_found,
            "analysis finished"
        );
        Ok(report)
    }
}

/// Decodes a finished recording back to RGB24 through ffmpeg, after probing
/// the container's geometry with ffprobe.
pub struct FileReplay {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    sequence: u64,
}

impl FileReplay {
    pub fn open(path: &str) -> Result<Self> {
        let open_err = |reason: String| Error::StreamOpen {
            url: path.to_string(),
            reason,
        };

        let (width, height) = probe_geometry(path)?;

        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-f")
            .arg("rawvideo")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| open_err(err.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| open_err("failed to capture decoder stdout".into()))?;

        info!(path, width, height, "replaying recording");

        Ok(Self {
            child,
            stdout,
            width,
            height,
            sequence: 0,
        })
    }
}

impl ReplayRead for FileReplay {
    fn next(&mut self) -> Result<Option<Frame>> {
        let frame_bytes =
            self.width as usize * self.height as usize * PixelFormat::Rgb24.bytes_per_pixel();
        let mut buffer = vec![0u8; frame_bytes];

        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {
                self.sequence += 1;
                Ok(Some(Frame {
                    data: Bytes::from(buffer),
                    meta: Arc::new(FrameMetadata {
                        sequence: self.sequence,
                        width: self.width,
                        height: self.height,
                        format: PixelFormat::Rgb24,
                    }),
                    timestamp: Instant::now(),
                }))
            }
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(Error::Acquisition(format!("replay decode failed: {err}"))),
        }
    }
}

impl Drop for FileReplay {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Asks ffprobe for the video stream's dimensions.
fn probe_geometry(path: &str) -> Result<(u32, u32)> {
    let open_err = |reason: String| Error::StreamOpen {
        url: path.to_string(),
        reason,
    };

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path)
        .output()
        .map_err(|err| open_err(format!("ffprobe: {err}")))?;

    if !output.status.success() {
        return Err(open_err(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|err| open_err(format!("ffprobe output unreadable: {err}")))?;
    let stream = json["streams"]
        .as_array()
        .and_then(|streams| streams.first())
        .ok_or_else(|| open_err("no video stream in recording".into()))?;

    let width = stream["width"].as_u64().unwrap_or(0) as u32;
    let height = stream["height"].as_u64().unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err(open_err("recording reports no geometry".into()));
    }
    Ok((width, height))
}
