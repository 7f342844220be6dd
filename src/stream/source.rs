//! Live stream decoding through an external ffmpeg process.

use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use flume::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::stream::frame::{Frame, FrameMetadata, PixelFormat};
use crate::StreamConfig;

/// Pull-based frame producer with bounded buffering.
pub trait StreamSource {
    /// Blocks up to `timeout` for the next decoded frame, in arrival order.
    fn next_frame(&mut self, timeout: Duration) -> Result<Frame>;

    /// Negotiated output geometry, fixed for the life of the source.
    fn geometry(&self) -> (u32, u32);
}

/// Decodes an H.264-over-UDP transport into raw RGB24 frames.
///
/// The ffmpeg child owns the codec work; a reader thread slices its stdout
/// into fixed-size frames and feeds a bounded channel. The scaler pins every
/// frame to the configured geometry, so the geometry reported at open time
/// holds for the whole stream.
pub struct UdpDecodeSource {
    rx: Receiver<Result<Frame>>,
    /// First frame, pulled during open to fail fast on a dead transport.
    primed: Option<Frame>,
    width: u32,
    height: u32,
}

impl UdpDecodeSource {
    /// Spawns the decoder against `config.url` and waits for the first
    /// frame, so a transport that never produces one fails the open instead
    /// of the recording.
    pub fn open(config: &StreamConfig) -> Result<Self> {
        let open_err = |reason: String| Error::StreamOpen {
            url: config.url.clone(),
            reason,
        };

        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-fflags")
            .arg("nobuffer")
            .arg("-flags")
            .arg("low_delay")
            .arg("-i")
            .arg(&config.url)
            .arg("-vf")
            .arg(format!("scale={}:{}", config.width, config.height))
            .arg("-r")
            .arg(config.fps.to_string())
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

        let (tx, rx) = flume::bounded(config.buffer_depth);
        let geometry = (config.width, config.height);
        thread::spawn(move || decode_loop(stdout, child, geometry, tx));

        let primed = match rx.recv_timeout(config.open_timeout) {
            Ok(Ok(frame)) => frame,
            Ok(Err(err)) => return Err(open_err(err.to_string())),
            Err(_) => {
                return Err(open_err(format!(
                    "no frame within {:?}",
                    config.open_timeout
                )))
            }
        };

        info!(
            width = geometry.0,
            height = geometry.1,
            fps = config.fps,
            "video stream open"
        );

        Ok(Self {
            rx,
            primed: Some(primed),
            width: geometry.0,
            height: geometry.1,
        })
    }
}

impl StreamSource for UdpDecodeSource {
    fn next_frame(&mut self, timeout: Duration) -> Result<Frame> {
        if let Some(frame) = self.primed.take() {
            return Ok(frame);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                Err(Error::Acquisition(format!("no frame within {timeout:?}")))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Acquisition("decoder exited".into()))
            }
        }
    }

    fn geometry(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Reader thread body. The bounded send backpressures the decoder when the
/// consumer falls behind; a short read means the child died or the transport
/// collapsed, which surfaces as one final error on the channel.
fn decode_loop(
    mut stdout: ChildStdout,
    mut child: Child,
    (width, height): (u32, u32),
    tx: Sender<Result<Frame>>,
) {
    let frame_bytes = width as usize * height as usize * PixelFormat::Rgb24.bytes_per_pixel();
    let mut buffer = vec![0u8; frame_bytes];
    let mut sequence = 0u64;

    loop {
        match stdout.read_exact(&mut buffer) {
            Ok(()) => {
                sequence += 1;
                let frame = Frame {
                    data: Bytes::copy_from_slice(&buffer),
                    meta: Arc::new(FrameMetadata {
                        sequence,
                        width,
                        height,
                        format: PixelFormat::Rgb24,
                    }),
                    timestamp: Instant::now(),
                };
                if tx.send(Ok(frame)).is_err() {
                    // Receiver gone, nothing left to decode for.
                    break;
                }
            }
            Err(err) => {
                let _ = tx.send(Err(Error::Acquisition(format!(
                    "decoder stream ended: {err}"
                ))));
                break;
            }
        }
    }

    debug!(frames = sequence, "decode loop stopped");
    let _ = child.kill();
    let _ = child.wait();
}
