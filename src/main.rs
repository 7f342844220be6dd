//! Kestrel: scripted drone flight with concurrent video recording and
//! offline face analysis.

use color_eyre::{eyre::eyre, Result};
use tracing::{error, info};

use kestrel::analyze;
use kestrel::display::{Sdl2Display, VideoDisplay};
use kestrel::flight::TelloLink;
use kestrel::session;
use kestrel::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("kestrel=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("Kestrel launching...");

    let config = Config::default();

    // Setup failures (connection, stream open) abort here with a non-zero
    // exit; everything after the session is best-effort.
    let link = TelloLink::bind(&config.flight)?;
    let report = session::run_session(link, &config).await?;

    info!(
        frames = report.stats.frames_written,
        path = %report.recording_path,
        flight_failures = report.flight.failures.len(),
        "session complete"
    );

    // Offline pass over what was just recorded. Analyzer failures are
    // reported but never abort the program.
    let sdl_context = sdl2::init().map_err(|e| eyre!(e))?;
    let mut display = Sdl2Display::new(&sdl_context, config.stream.width, config.stream.height)?;

    match analyze::analyze_recording(&report.recording_path, &config.detector, &mut display) {
        Ok(analysis) => info!(
            frames = analysis.frames_scanned,
            regions = analysis.regions_found,
            "analysis complete"
        ),
        Err(err) => error!("analysis failed: {err}"),
    }

    info!("press any key in the video window to exit");
    display.wait_for_ack()?;

    info!("Kestrel shutting down");
    Ok(())
}
