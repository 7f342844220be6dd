//! Session orchestration: setup, the parallel flight/record phase, teardown.

use std::time::Duration;

use tokio::task;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::flight::{fly_plan, CommandPolicy, FlightLink, FlightPlan, FlightReport};
use crate::record::{record_stream, RecordStats};
use crate::stream::{MjpegFileSink, RecordingSink, StreamSource, UdpDecodeSource};
use crate::Config;

/// Connection lifecycle of one vehicle session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    StreamEnabled,
}

/// Everything one session produced.
#[derive(Debug)]
pub struct SessionReport {
    pub recording_path: String,
    pub flight: FlightReport,
    pub stats: RecordStats,
    pub record_outcome: Result<()>,
}

/// Runs one full session: connect, enable the stream, open source and sink,
/// fly the plan while recording, join both, report.
///
/// Setup failures abort immediately with the cause. Once the parallel phase
/// starts, each unit runs to its own completion and neither cancels the
/// other.
pub async fn run_session<L>(mut link: L, config: &Config) -> Result<SessionReport>
where
    L: FlightLink + Send + 'static,
{
    let mut state = SessionState::Disconnected;
    debug!(state = ?state, "session starting");

    if !config.session.settle_delay.is_zero() {
        // Give the vehicle's access point a moment before the first command.
        tokio::time::sleep(config.session.settle_delay).await;
    }

    link.connect()?;
    state = SessionState::Connected;
    info!(state = ?state, "vehicle connected");

    link.enable_video_stream()?;
    state = SessionState::StreamEnabled;
    info!(state = ?state, "video stream enabled");

    let source = UdpDecodeSource::open(&config.stream)?;
    let geometry = source.geometry();
    let sink = MjpegFileSink::open(&config.recording.path, geometry, config.recording.fps)?;

    let plan = FlightPlan::out_and_back(config.flight.maneuver_distance_cm);
    let (flight, stats, record_outcome) = fly_and_record(
        link,
        plan,
        config.session.command_policy,
        source,
        sink,
        config.session.record_duration,
        config.stream.pull_timeout,
    )
    .await?;

    Ok(SessionReport {
        recording_path: config.recording.path.clone(),
        flight,
        stats,
        record_outcome,
    })
}

/// The parallel phase.
///
/// The link moves into the sequencer task and the source/sink pair into the
/// record task; the two resource sets are disjoint, so the tasks need no
/// locking. The join is unconditional: a failure in one unit never cancels
/// the other, and both outcomes come back side by side.
pub async fn fly_and_record<L, S, K>(
    mut link: L,
    plan: FlightPlan,
    policy: CommandPolicy,
    mut source: S,
    mut sink: K,
    duration: Duration,
    pull_timeout: Duration,
) -> Result<(FlightReport, RecordStats, Result<()>)>
where
    L: FlightLink + Send + 'static,
    S: StreamSource + Send + 'static,
    K: RecordingSink + Send + 'static,
{
    let flight_task = task::spawn_blocking(move || fly_plan(&mut link, &plan, policy));
    let record_task =
        task::spawn_blocking(move || record_stream(&mut source, &mut sink, duration, pull_timeout));

    let (flight, record) = tokio::join!(flight_task, record_task);
    let flight = flight.map_err(join_error)?;
    let (stats, record_outcome) = record.map_err(join_error)?;

    if let Err(err) = &record_outcome {
        error!("recording ended early: {err}");
    }
    if !flight.all_ok() {
        warn!(
            failures = flight.failures.len(),
            aborted = flight.aborted,
            "flight plan had failures"
        );
    }

    Ok((flight, stats, record_outcome))
}

fn join_error(err: task::JoinError) -> Error {
    Error::Io(std::io::Error::other(format!("task join failed: {err}")))
}
