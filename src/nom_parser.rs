use nom::combinator::map;
use nom::number::complete::{be_u16, le_i16, le_i24, le_i32, le_i8, le_u16, le_u24, le_u32, u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::types::{Address, Size};

type Buf = [u8];

/// The five leading bytes of every reply payload.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub(crate) struct ReplyHeader {
    pub message_type: u8,
    pub access: u8,
    pub address: Address,
    pub size: u8,
}

pub(crate) const REPLY_HEADER_LEN: usize = 5;

/// Splits a reply payload into its header and the data following it.
/// Returns `None` if the payload is shorter than the header.
pub(crate) fn parse_reply(buf: &Buf) -> Option<(ReplyHeader, &Buf)> {
    match reply_header(buf) {
        Ok((data, header)) => Some((header, data)),
        Err(_) => None,
    }
}

fn reply_header(buf: &Buf) -> IResult<&Buf, ReplyHeader> {
    map(
        tuple((u8, u8, map(be_u16, Address::new), u8)),
        |(message_type, access, address, size)| ReplyHeader {
            message_type,
            access,
            address,
            size,
        },
    )(buf)
}

/// Little-endian two's complement integer of `size` bytes.
pub(crate) fn le_signed(buf: &Buf, size: Size) -> Option<i64> {
    let res: IResult<&Buf, i64> = match *size {
        1 => map(le_i8, i64::from)(buf),
        2 => map(le_i16, i64::from)(buf),
        3 => map(le_i24, i64::from)(buf),
        _ => map(le_i32, i64::from)(buf),
    };
    res.ok().map(|(_rest, value)| value)
}

/// Little-endian unsigned integer of `size` bytes.
pub(crate) fn le_unsigned(buf: &Buf, size: Size) -> Option<u64> {
    let res: IResult<&Buf, u64> = match *size {
        1 => map(u8, u64::from)(buf),
        2 => map(le_u16, u64::from)(buf),
        3 => map(le_u24, u64::from)(buf),
        _ => map(le_u32, u64::from)(buf),
    };
    res.ok().map(|(_rest, value)| value)
}
