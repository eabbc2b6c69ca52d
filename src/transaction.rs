//! A single request/response exchange with the controller.

use std::io::{self, Read, Write};

use log::{debug, trace};
use snafu::{ensure, ResultExt};

use crate::error::*;
use crate::frame::{build_request_frame, read_response_frame, ResponsePayload};

/// A byte stream connected to the controller.
///
/// Reads are expected to time out rather than block forever; a timed out read
/// may either return `Ok(0)` or an error of kind [`io::ErrorKind::TimedOut`].
pub trait Port: Read + Write {
    /// Drop any received bytes that haven't been read yet.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl Port for Box<dyn serialport::SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

impl<P: Port + ?Sized> Port for &mut P {
    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }
}

/// Send `payload` in a request frame and return the payload of the response frame.
///
/// Stale input left over from an earlier failed exchange is discarded first.
/// Nothing is retried; any failure ends the exchange.
pub fn execute<P: Port + ?Sized>(port: &mut P, payload: &[u8]) -> Result<ResponsePayload> {
    port.discard_input().context(IoSnafu)?;

    let frame = build_request_frame(payload)?;
    trace!("tx frame {:02x?}", &frame[..]);
    let written = port.write(&frame).context(IoSnafu)?;
    ensure!(
        written == frame.len(),
        WriteIncompleteSnafu {
            written,
            expected: frame.len()
        }
    );
    port.flush().context(IoSnafu)?;

    let response = read_response_frame(port)?;
    debug!(
        "Exchanged {} byte request for {} byte response",
        payload.len(),
        response.len()
    );
    Ok(response)
}
