//! Types for register addresses and register widths, meant to keep
//! out-of-range requests from ever reaching the wire.

use core::fmt;
use core::ops::Deref;

use snafu::ensure;

use crate::error::{Error, InvalidSizeSnafu};

/// A 16-bit register location in the controller's memory map.
///
/// Sent big-endian on the wire.
///
/// ## Example
/// ```
/// use optolink_proto::Address;
/// let addr = Address::new(0x0802);
/// assert_eq!(addr.to_bytes(), [0x08, 0x02]);
/// assert_eq!(addr.to_string(), "0x0802");
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct Address(u16);

impl Address {
    pub const fn new(address: u16) -> Self {
        Self(address)
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl Deref for Address {
    type Target = u16;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u16> for Address {
    fn from(address: u16) -> Self {
        Self(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// `Size` is a range-checked \[1, 4\] byte count, the width of a register
/// read and of the integer stored there.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct Size(u8);

/// Create a new [`Size`], panics if it is out of range.
pub const fn size(s: u8) -> Size {
    if s >= 1 && s <= 4 {
        Size(s)
    } else {
        panic!("Invalid register size.")
    }
}

impl Size {
    /// Create a new `Size`, checking that it is in \[1, 4\].
    /// # Errors
    /// Returns [`Error::InvalidSize`] if `size` is out of range.
    pub fn new(size: usize) -> Result<Self, Error> {
        ensure!((1..=4).contains(&size), InvalidSizeSnafu { size });
        Ok(Self(size as u8))
    }

    /// Number of bytes as `usize`, for slicing.
    pub const fn bytes(self) -> usize {
        self.0 as usize
    }

    /// Largest unsigned integer that fits in this many bytes.
    pub const fn max_unsigned(self) -> u64 {
        (1u64 << (8 * self.0 as u32)) - 1
    }
}

impl Deref for Size {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
