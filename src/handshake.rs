//! Link establishment: wake the controller, then switch it to the framed protocol.

use log::{debug, warn};
use snafu::{ensure, ResultExt};

use crate::bytes::{ACK, SYNC, WAKE, WAKE_ACK};
use crate::error::*;
use crate::frame::read_byte;
use crate::transaction::Port;

/// Number of wake bytes sent before giving up.
pub const WAKE_ATTEMPTS: usize = 10;

/// Wake the controller and synchronise the link.
///
/// Sends [`WAKE`] until the controller answers with [`WAKE_ACK`], at most
/// [`WAKE_ATTEMPTS`] times, then sends [`SYNC`] which must be acknowledged
/// with [`ACK`].
///
/// # Errors
/// [`Error::NoHandshakeResponse`] if the controller never woke up,
/// [`Error::SyncRejected`] if it didn't acknowledge the sync command,
/// [`Error::HandshakeIo`] if the stream itself failed.
pub fn establish<P: Port + ?Sized>(port: &mut P) -> Result<()> {
    let mut awake = false;
    for attempt in 1..=WAKE_ATTEMPTS {
        port.write_all(&[WAKE]).context(HandshakeIoSnafu)?;
        port.flush().context(HandshakeIoSnafu)?;
        match read_byte(port).map_err(handshake_io)? {
            Some(WAKE_ACK) => {
                debug!("Controller awake after {} attempt(s)", attempt);
                awake = true;
                break;
            }
            got => debug!("Wake attempt {} answered with {:02x?}", attempt, got),
        }
    }
    ensure!(
        awake,
        NoHandshakeResponseSnafu {
            attempts: WAKE_ATTEMPTS
        }
    );

    port.write_all(&SYNC).context(HandshakeIoSnafu)?;
    port.flush().context(HandshakeIoSnafu)?;
    let got = read_byte(port).map_err(handshake_io)?;
    if got != Some(ACK) {
        warn!("Sync rejected with {:02x?}", got);
        return SyncRejectedSnafu { got }.fail();
    }
    debug!("Link synchronised");
    Ok(())
}

/// Stream failures before the link is up are connection errors.
fn handshake_io(err: Error) -> Error {
    match err {
        Error::Io { source } => Error::HandshakeIo { source },
        other => other,
    }
}
