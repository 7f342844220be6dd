//! The capture-record loop: moves frames from a live source into a sink for
//! a bounded wall-clock window, preserving arrival order.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::error::{Error, Result};
use crate::stream::{RecordingSink, StreamSource};

/// What a single loop run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    pub frames_written: u64,
    pub elapsed: Duration,
}

/// Pulls frames until the deadline and hands each to the sink in arrival
/// order.
///
/// The deadline is measured from this call's own start; a zero duration
/// stops before the first pull. A pull failure, an empty frame, or a sink
/// write failure stops the loop early. Whatever stopped it, the sink is
/// finalized before returning so the recording stays playable.
pub fn record_stream<S, K>(
    source: &mut S,
    sink: &mut K,
    duration: Duration,
    pull_timeout: Duration,
) -> (RecordStats, Result<()>)
where
    S: StreamSource,
    K: RecordingSink,
{
    let start = Instant::now();
    let mut frames_written = 0u64;
    let mut outcome = Ok(());

    loop {
        if start.elapsed() >= duration {
            break;
        }

        let frame = match source.next_frame(pull_timeout) {
            Ok(frame) => frame,
            Err(err) => {
                error!("frame pull failed: {err}");
                outcome = Err(err);
                break;
            }
        };

        if frame.is_empty() {
            let err = Error::Acquisition(format!(
                "empty frame #{} from source",
                frame.meta.sequence
            ));
            error!("{err}");
            outcome = Err(err);
            break;
        }

        if let Err(err) = sink.write(&frame) {
            error!("sink write failed: {err}");
            outcome = Err(err);
            break;
        }
        frames_written += 1;
    }

    // Mandatory cleanup on every exit path.
    if let Err(err) = sink.finalize() {
        match outcome {
            Ok(()) => outcome = Err(err),
            Err(_) => error!("finalize after failed recording also failed: {err}"),
        }
    }

    let stats = RecordStats {
        frames_written,
        elapsed: start.elapsed(),
    };
    info!(
        frames = stats.frames_written,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "recording stopped"
    );
    (stats, outcome)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Instant;

    use bytes::Bytes;

    use super::*;
    use crate::stream::{Frame, FrameMetadata, PixelFormat};

    const W: u32 = 4;
    const H: u32 = 4;

    fn frame(sequence: u64) -> Frame {
        Frame {
            data: Bytes::from(vec![0u8; (W * H * 3) as usize]),
            meta: Arc::new(FrameMetadata {
                sequence,
                width: W,
                height: H,
                format: PixelFormat::Rgb24,
            }),
            timestamp: Instant::now(),
        }
    }

    fn empty_frame(sequence: u64) -> Frame {
        Frame {
            data: Bytes::new(),
            meta: Arc::new(FrameMetadata {
                sequence,
                width: W,
                height: H,
                format: PixelFormat::Rgb24,
            }),
            timestamp: Instant::now(),
        }
    }

    /// Plays back a scripted pull sequence; optionally keeps producing
    /// fresh frames once the script runs out.
    struct MockSource {
        script: VecDeque<Result<Frame>>,
        endless: bool,
        sequence: u64,
    }

    impl MockSource {
        fn scripted(script: Vec<Result<Frame>>) -> Self {
            Self {
                script: script.into(),
                endless: false,
                sequence: 0,
            }
        }

        fn endless() -> Self {
            Self {
                script: VecDeque::new(),
                endless: true,
                sequence: 0,
            }
        }
    }

    impl StreamSource for MockSource {
        fn next_frame(&mut self, _timeout: Duration) -> Result<Frame> {
            if let Some(next) = self.script.pop_front() {
                return next;
            }
            if self.endless {
                self.sequence += 1;
                return Ok(frame(self.sequence));
            }
            Err(Error::Acquisition("script exhausted".into()))
        }

        fn geometry(&self) -> (u32, u32) {
            (W, H)
        }
    }

    #[derive(Default)]
    struct MockSink {
        written: Vec<u64>,
        finalized: usize,
        fail_write: bool,
    }

    impl RecordingSink for MockSink {
        fn write(&mut self, frame: &Frame) -> Result<()> {
            if self.fail_write {
                return Err(Error::Io(std::io::Error::other("pipe closed")));
            }
            self.written.push(frame.meta.sequence);
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            self.finalized += 1;
            Ok(())
        }
    }

    const PULL: Duration = Duration::from_millis(50);

    #[test]
    fn zero_duration_writes_nothing() {
        let mut source = MockSource::endless();
        let mut sink = MockSink::default();

        let (stats, outcome) = record_stream(&mut source, &mut sink, Duration::ZERO, PULL);

        assert!(outcome.is_ok());
        assert_eq!(stats.frames_written, 0);
        assert!(sink.written.is_empty());
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn preserves_arrival_order_until_pull_failure() {
        let mut script: Vec<Result<Frame>> = (1..=49).map(|seq| Ok(frame(seq))).collect();
        script.push(Err(Error::Acquisition("transport died".into())));
        let mut source = MockSource::scripted(script);
        let mut sink = MockSink::default();

        let (stats, outcome) =
            record_stream(&mut source, &mut sink, Duration::from_secs(60), PULL);

        assert!(matches!(outcome, Err(Error::Acquisition(_))));
        assert_eq!(stats.frames_written, 49);
        assert_eq!(sink.written, (1..=49).collect::<Vec<_>>());
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn empty_frame_stops_the_loop() {
        let script = vec![Ok(frame(1)), Ok(frame(2)), Ok(empty_frame(3)), Ok(frame(4))];
        let mut source = MockSource::scripted(script);
        let mut sink = MockSink::default();

        let (stats, outcome) =
            record_stream(&mut source, &mut sink, Duration::from_secs(60), PULL);

        assert!(matches!(outcome, Err(Error::Acquisition(_))));
        assert_eq!(stats.frames_written, 2);
        assert_eq!(sink.written, [1, 2]);
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn write_failure_still_finalizes() {
        let mut source = MockSource::endless();
        let mut sink = MockSink {
            fail_write: true,
            ..Default::default()
        };

        let (stats, outcome) =
            record_stream(&mut source, &mut sink, Duration::from_secs(60), PULL);

        assert!(matches!(outcome, Err(Error::Io(_))));
        assert_eq!(stats.frames_written, 0);
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn deadline_bounds_elapsed_time() {
        let mut source = MockSource::endless();
        let mut sink = MockSink::default();
        let duration = Duration::from_millis(50);

        let (stats, outcome) = record_stream(&mut source, &mut sink, duration, PULL);

        assert!(outcome.is_ok());
        assert!(stats.frames_written > 0);
        assert!(stats.elapsed >= duration);
        // Worst case is one full pull plus scheduling slack past the deadline.
        assert!(stats.elapsed < duration + PULL + Duration::from_millis(100));
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn finalize_runs_once_on_normal_stop() {
        let mut source = MockSource::endless();
        let mut sink = MockSink::default();

        let (_, outcome) =
            record_stream(&mut source, &mut sink, Duration::from_millis(10), PULL);

        assert!(outcome.is_ok());
        assert_eq!(sink.finalized, 1);
    }
}
