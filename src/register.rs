//! Raw register access: read `size` bytes at an address, or write bytes to it.

use arrayvec::ArrayVec;
use log::debug;
use snafu::ensure;

use crate::error::*;
use crate::frame::MAX_PAYLOAD;
use crate::nom_parser::{parse_reply, REPLY_HEADER_LEN};
use crate::transaction::{execute, Port};
use crate::types::{Address, Size};

/// First byte of every reply payload.
pub const REPLY: u8 = 0x01;
/// Access code of a register read.
pub const READ_ACCESS: u8 = 0x01;
/// Access code of a register write.
pub const WRITE_ACCESS: u8 = 0x02;

/// Longest data accepted by [`write`], bounded by the frame payload limit.
pub const MAX_WRITE_LEN: usize = MAX_PAYLOAD - REPLY_HEADER_LEN;

/// The bytes of one register read.
pub type RegisterData = ArrayVec<u8, 4>;

type Command = ArrayVec<u8, MAX_PAYLOAD>;

fn command(access: u8, address: Address, len: u8) -> Command {
    let mut cmd = Command::new();
    let [hi, lo] = address.to_bytes();
    cmd.extend([0x00, access, hi, lo, len]);
    cmd
}

/// Read `size` bytes starting at `address`.
///
/// # Errors
/// Transport errors from the exchange, or [`Error::InvalidReadResponse`] if the
/// reply doesn't echo the request.
pub fn read<P: Port + ?Sized>(port: &mut P, address: Address, size: Size) -> Result<RegisterData> {
    debug!("Reading {} bytes at {}", *size, address);
    let response = execute(port, &command(READ_ACCESS, address, *size))?;

    let invalid = |field| InvalidReadResponseSnafu { address, field };
    ensure!(
        response.len() == REPLY_HEADER_LEN + size.bytes(),
        invalid(ReadField::Length)
    );
    let (header, data) = parse_reply(&response).ok_or_else(|| invalid(ReadField::Length).build())?;
    ensure!(header.message_type == REPLY, invalid(ReadField::MessageType));
    ensure!(header.access == READ_ACCESS, invalid(ReadField::AccessType));
    ensure!(header.address == address, invalid(ReadField::Address));
    ensure!(header.size == *size, invalid(ReadField::Size));

    Ok(data.iter().copied().collect())
}

/// Write `data` starting at `address`.
///
/// The reply is checked field by field, in the order the controller echoes
/// them, and the first mismatch is reported as [`Error::WriteResponseMismatch`].
pub fn write<P: Port + ?Sized>(port: &mut P, address: Address, data: &[u8]) -> Result<()> {
    ensure!(
        data.len() <= MAX_WRITE_LEN,
        PayloadTooLargeSnafu {
            len: REPLY_HEADER_LEN + data.len()
        }
    );
    debug!("Writing {:02x?} at {}", data, address);
    let mut cmd = command(WRITE_ACCESS, address, data.len() as u8);
    cmd.extend(data.iter().copied());
    let response = execute(port, &cmd)?;

    let mismatch = |mismatch| WriteResponseMismatchSnafu { address, mismatch };
    let header = match parse_reply(&response) {
        Some((header, rest)) if rest.is_empty() => header,
        _ => return mismatch(WriteMismatch::WrongLength).fail(),
    };
    ensure!(header.address == address, mismatch(WriteMismatch::WrongAddress));
    ensure!(header.message_type == REPLY, mismatch(WriteMismatch::WrongMessageType));
    ensure!(header.access == WRITE_ACCESS, mismatch(WriteMismatch::WrongAccessType));
    ensure!(
        header.size as usize == data.len(),
        mismatch(WriteMismatch::WrongSize)
    );
    Ok(())
}
