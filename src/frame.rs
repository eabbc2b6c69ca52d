//! Request frame construction and response frame parsing.
//!
//! A frame is `41 <len> <payload...> <checksum>`, the checksum being the byte
//! sum of `<len>` and the payload. A response frame is preceded by a single
//! ACK/NAK byte which is classified here as well.

use std::io::{ErrorKind, Read};

use arrayvec::ArrayVec;
use log::{trace, warn};
use snafu::{ensure, ResultExt};

use crate::bytes::{ACK, FRAME_START, NAK};
use crate::checksum;
use crate::error::*;

/// Largest payload accepted in an outgoing frame.
pub const MAX_PAYLOAD: usize = 100;

/// Start byte, length byte, payload and checksum.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD + 3;

/// An encoded request frame, ready to be written.
pub type RequestFrame = ArrayVec<u8, MAX_FRAME_LEN>;

/// The payload of a response frame. The single length byte bounds its size.
pub type ResponsePayload = ArrayVec<u8, 255>;

/// Encode `payload` into a request frame.
/// # Errors
/// Returns [`Error::PayloadTooLarge`] if `payload` is longer than [`MAX_PAYLOAD`].
pub fn build_request_frame(payload: &[u8]) -> Result<RequestFrame> {
    ensure!(
        payload.len() <= MAX_PAYLOAD,
        PayloadTooLargeSnafu { len: payload.len() }
    );
    let mut frame = RequestFrame::new();
    frame.push(FRAME_START);
    frame.push(payload.len() as u8);
    // Capacity is checked above
    frame.extend(payload.iter().copied());
    frame.push(checksum(&frame[1..]));
    Ok(frame)
}

/// Read the ACK byte and the response frame following it, and return the
/// verified payload.
pub fn read_response_frame<R: Read + ?Sized>(stream: &mut R) -> Result<ResponsePayload> {
    match read_byte(stream)? {
        None => return NoAckSnafu.fail(),
        Some(ACK) => {}
        Some(NAK) => {
            warn!("Controller answered NAK");
            return NakReceivedSnafu.fail();
        }
        Some(got) => return UnexpectedAckByteSnafu { got }.fail(),
    }

    match read_byte(stream)? {
        Some(FRAME_START) => {}
        got => return MissingFrameStartSnafu { got }.fail(),
    }

    let declared = read_byte(stream)?.ok_or(Error::MissingFrameSize)?;

    // length byte, payload and checksum, kept together for the checksum
    let mut frame: ArrayVec<u8, 257> = ArrayVec::new();
    frame.push(declared);
    let expected = declared as usize + 1;
    for got in 0..expected {
        match read_byte(stream)? {
            Some(byte) => frame.push(byte),
            None => return FrameTooShortSnafu { got, expected }.fail(),
        }
    }
    trace!("rx frame {:02x?}", &frame[..]);

    let (received, body) = match frame.split_last() {
        Some((received, body)) => (*received, body),
        None => return MissingFrameSizeSnafu.fail(),
    };
    let computed = checksum(body);
    if computed != received {
        warn!(
            "Checksum mismatch on response, computed 0x{:02x}, received 0x{:02x}",
            computed, received
        );
        return ChecksumMismatchSnafu { computed, received }.fail();
    }

    Ok(body[1..].iter().copied().collect())
}

/// Read a single byte. A timeout or end of stream is reported as `None`.
pub(crate) fn read_byte<R: Read + ?Sized>(stream: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context(IoSnafu),
        }
    }
}
