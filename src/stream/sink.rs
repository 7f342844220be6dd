//! Recording sink backed by an external ffmpeg encoder.

use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::stream::frame::Frame;

/// Push-based frame persister. Frames must arrive in order and with the
/// geometry negotiated at open time.
pub trait RecordingSink {
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the container. Idempotent; must run on every exit
    /// path of whoever drives the sink.
    fn finalize(&mut self) -> Result<()>;
}

/// Persists raw RGB24 frames as an MJPEG AVI file.
///
/// Frames stream into the encoder child over stdin; finalize closes the
/// pipe and waits for the child to flush the container.
pub struct MjpegFileSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    path: String,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl MjpegFileSink {
    pub fn open(path: &str, (width, height): (u32, u32), fps: u32) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-s")
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-c:v")
            .arg("mjpeg")
            .arg("-q:v")
            .arg("3")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            Error::Io(std::io::Error::other("failed to capture encoder stdin"))
        })?;

        info!(path, width, height, fps, "recording sink open");

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            path: path.to_string(),
            width,
            height,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl RecordingSink for MjpegFileSink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        if frame.geometry() != (self.width, self.height) {
            // Geometry is fixed at open time; a mismatch is fatal.
            return Err(Error::Acquisition(format!(
                "frame #{} geometry {:?} does not match recording {}x{}",
                frame.meta.sequence,
                frame.geometry(),
                self.width,
                self.height
            )));
        }
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            Error::Io(std::io::Error::other("recording already finalized"))
        })?;
        stdin.write_all(&frame.data)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        // Dropping stdin is the encoder's EOF. Second and later calls find
        // nothing to do.
        if let Some(stdin) = self.stdin.take() {
            drop(stdin);
        }
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                return Err(Error::Io(std::io::Error::other(format!(
                    "encoder exited with {status}"
                ))));
            }
            info!(
                path = %self.path,
                frames = self.frames_written,
                "recording finalized"
            );
        }
        Ok(())
    }
}

impl Drop for MjpegFileSink {
    fn drop(&mut self) {
        if let Err(err) = self.finalize() {
            warn!("recording sink dropped without clean finalize: {err}");
        }
    }
}
