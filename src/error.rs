use thiserror::Error;

/// Result alias that carries the crate [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes across the pipeline.
///
/// `Connection` and `StreamOpen` are setup failures and abort the session
/// before any concurrent work starts. The rest stay local to the unit that
/// hit them: an `Acquisition` error stops only the capture-record loop, a
/// `Command` error stays inside the flight sequencer, and `ModelLoad` is
/// fatal to the offline analyzer alone.
#[derive(Debug, Error)]
pub enum Error {
    #[error("vehicle unreachable at {addr}: {reason}")]
    Connection { addr: String, reason: String },

    #[error("unable to open video stream {url}: {reason}")]
    StreamOpen { url: String, reason: String },

    #[error("frame acquisition failed: {0}")]
    Acquisition(String),

    #[error("flight command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("detector model {path} failed to load: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("display error: {0}")]
    Display(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
