//! Command link to the vehicle: the Tello text-over-UDP protocol.

use std::net::UdpSocket;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::FlightConfig;

/// Command capability set of the vehicle. Every command is
/// fire-and-forget-with-ack: success or failure, no payload.
pub trait FlightLink {
    fn connect(&mut self) -> Result<()>;
    fn enable_video_stream(&mut self) -> Result<()>;
    fn takeoff(&mut self) -> Result<()>;
    fn land(&mut self) -> Result<()>;
    fn move_forward(&mut self, distance_cm: u32) -> Result<()>;
    fn move_back(&mut self, distance_cm: u32) -> Result<()>;
}

/// The SDK accepts relative moves between 20 and 500 cm.
const MIN_MOVE_CM: u32 = 20;
const MAX_MOVE_CM: u32 = 500;

/// UDP adapter speaking the textual SDK protocol. One datagram per command,
/// one `ok`/`error` ack per datagram, read with a timeout.
pub struct TelloLink {
    socket: UdpSocket,
    addr: String,
    timeout: Duration,
}

impl TelloLink {
    /// Binds a local socket for the command channel. Nothing is sent until
    /// [`FlightLink::connect`].
    pub fn bind(config: &FlightConfig) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(config.command_timeout))?;
        Ok(Self {
            socket,
            addr: config.command_addr.clone(),
            timeout: config.command_timeout,
        })
    }

    /// Sends one command and blocks for the vehicle's ack.
    fn command(&mut self, cmd: &str) -> Result<()> {
        let fail = |reason: String| Error::Command {
            command: cmd.to_string(),
            reason,
        };

        debug!(%cmd, "sending flight command");
        self.socket
            .send_to(cmd.as_bytes(), &self.addr)
            .map_err(|err| fail(err.to_string()))?;

        let mut buf = [0u8; 1024];
        let n = self
            .socket
            .recv(&mut buf)
            .map_err(|err| fail(format!("no ack within {:?}: {err}", self.timeout)))?;

        let reply = String::from_utf8_lossy(&buf[..n]).trim().to_string();
        debug!(%cmd, %reply, "flight command acknowledged");
        if reply.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(fail(format!("vehicle replied `{reply}`")))
        }
    }
}

impl FlightLink for TelloLink {
    fn connect(&mut self) -> Result<()> {
        // "command" switches the vehicle into SDK mode. Failing here means
        // the link is down and the whole session aborts.
        self.command("command").map_err(|err| Error::Connection {
            addr: self.addr.clone(),
            reason: err.to_string(),
        })
    }

    fn enable_video_stream(&mut self) -> Result<()> {
        self.command("streamon")
    }

    fn takeoff(&mut self) -> Result<()> {
        self.command("takeoff")
    }

    fn land(&mut self) -> Result<()> {
        self.command("land")
    }

    fn move_forward(&mut self, distance_cm: u32) -> Result<()> {
        let cm = distance_cm.clamp(MIN_MOVE_CM, MAX_MOVE_CM);
        self.command(&format!("forward {cm}"))
    }

    fn move_back(&mut self, distance_cm: u32) -> Result<()> {
        let cm = distance_cm.clamp(MIN_MOVE_CM, MAX_MOVE_CM);
        self.command(&format!("back {cm}"))
    }
}
