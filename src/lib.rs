//! Client side of the Optolink register protocol spoken by Viessmann style
//! heating controllers over their optical serial interface.
//!
//! The crate is layered bottom-up:
//!
//! * [`frame`] builds request frames and reads back response frames.
//! * [`transaction`] runs one request/response exchange over a [`Port`].
//! * [`register`] reads and writes raw register bytes.
//! * [`handshake`] wakes the controller and synchronises the link.
//! * [`sensor`] maps sensor names to registers and decodes their values.
//! * [`session`] ties it together into the two operations a service needs:
//!   reading all measurements and writing a single value.
//!
//! ## Example
//!
//! ```no_run
//! use optolink_proto::{Session, SensorRegistry};
//!
//! # fn main() -> Result<(), optolink_proto::Error> {
//! let registry = SensorRegistry::standard();
//! let mut session = Session::open("/dev/ttyUSB0", &registry)?;
//! for (name, value) in session.get_measurements()?.iter() {
//!     println!("{}: {}", name, value);
//! }
//! session.write_value("ww_target_temp", 48.0)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod frame;
pub mod handshake;
mod nom_parser;
pub mod register;
pub mod sensor;
pub mod session;
pub mod transaction;
pub mod types;

pub use config::LinkSettings;
pub use error::{Error, ErrorCategory, ReadField, Result, WriteMismatch};
pub use sensor::{Encoding, Measurements, SensorDefinition, SensorRegistry, Value};
pub use session::{LinkState, Session};
pub use transaction::Port;
pub use types::{Address, Size};

/// Single byte control codes used on the link.
pub mod bytes {
    /// Sent by the client to wake the controller.
    pub const WAKE: u8 = 0x04;
    /// The controller's answer to [`WAKE`].
    pub const WAKE_ACK: u8 = 0x05;
    /// Positive acknowledge, after sync and after every request frame.
    pub const ACK: u8 = 0x06;
    /// Negative acknowledge, the controller rejected the request frame.
    pub const NAK: u8 = 0x15;
    /// First byte of every frame.
    pub const FRAME_START: u8 = 0x41;
    /// Switches the controller into the framed protocol.
    pub const SYNC: [u8; 3] = [0x16, 0x00, 0x00];
}

/// Frame checksum, the byte sum modulo 256 over the length byte and the payload.
///
/// `data` is expected to start with the length byte.
pub(crate) fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}
