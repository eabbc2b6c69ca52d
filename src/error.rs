//! Error type shared by all protocol layers.
//!
//! Every failure is terminal for the operation that hit it. The only retry in
//! the crate is the wake loop of the handshake.

use snafu::Snafu;

use crate::types::Address;

/// Result alias with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which echoed field of a register read reply disagreed with the request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadField {
    /// The reply payload isn't 5 + size bytes long.
    Length,
    /// The first byte isn't the reply marker.
    MessageType,
    /// The second byte isn't the read access code.
    AccessType,
    /// The echoed register address differs.
    Address,
    /// The echoed size differs.
    Size,
}

/// Reason a register write reply was rejected, in the order the fields are checked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteMismatch {
    WrongLength,
    WrongAddress,
    WrongMessageType,
    WrongAccessType,
    WrongSize,
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The link could not be opened or established.
    Connection,
    /// A frame could not be exchanged.
    Transport,
    /// A frame arrived, but its content doesn't answer the request.
    Protocol,
    /// The request was refused before anything was sent.
    Validation,
    /// A measurement sweep failed on one sensor.
    SensorRead,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The serial device could not be opened.
    #[snafu(display("Failed to open serial device {}: {}", path, source))]
    OpenPort {
        path: String,
        source: serialport::Error,
    },
    /// The controller never answered the wake byte.
    #[snafu(display("No handshake response after {} attempts", attempts))]
    NoHandshakeResponse { attempts: usize },
    /// The controller didn't acknowledge the sync command.
    #[snafu(display("Sync rejected (got {:02x?})", got))]
    SyncRejected { got: Option<u8> },
    /// The stream failed while the link was being established.
    #[snafu(display("I/O error during handshake: {}", source))]
    HandshakeIo { source: std::io::Error },

    /// Reading or writing the stream failed for a reason other than a timeout.
    #[snafu(display("I/O error: {}", source))]
    Io { source: std::io::Error },
    #[snafu(display("Short write ({} of {} bytes)", written, expected))]
    WriteIncomplete { written: usize, expected: usize },
    #[snafu(display("No ACK on transmission (got nothing)"))]
    NoAck,
    #[snafu(display("NAK received, controller reported a bad checksum"))]
    NakReceived,
    #[snafu(display("No ACK on transmission (got 0x{:02x})", got))]
    UnexpectedAckByte { got: u8 },
    #[snafu(display("No frame start (got {:02x?})", got))]
    MissingFrameStart { got: Option<u8> },
    #[snafu(display("No frame size"))]
    MissingFrameSize,
    #[snafu(display(
        "Response frame too short (received {} of {} bytes expected)",
        got,
        expected
    ))]
    FrameTooShort { got: usize, expected: usize },
    #[snafu(display(
        "Bad checksum on response (computed 0x{:02x}, received 0x{:02x})",
        computed,
        received
    ))]
    ChecksumMismatch { computed: u8, received: u8 },

    #[snafu(display("Invalid read response for {}: {:?} mismatch", address, field))]
    InvalidReadResponse { address: Address, field: ReadField },
    #[snafu(display("Invalid write response for {}: {:?}", address, mismatch))]
    WriteResponseMismatch {
        address: Address,
        mismatch: WriteMismatch,
    },

    /// A request payload exceeds the frame limit of 100 bytes.
    #[snafu(display("Payload too large ({} bytes)", len))]
    PayloadTooLarge { len: usize },
    /// Register reads are 1 to 4 bytes wide.
    #[snafu(display("Invalid register size {}", size))]
    InvalidSize { size: usize },
    #[snafu(display("Unknown sensor {:?}", name))]
    UnknownSensor { name: String },
    #[snafu(display("Sensor {:?} is read-only", name))]
    NotWritable { name: String },
    #[snafu(display("Sensor {:?} defined twice", name))]
    DuplicateSensor { name: String },
    #[snafu(display("Value {} out of range for sensor {:?}", value, name))]
    ValueOutOfRange { name: String, value: f64 },

    /// Reading one sensor of a measurement sweep failed, voiding the sweep.
    #[snafu(display("Failed to read sensor {:?}: {}", sensor, source))]
    SensorRead {
        sensor: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        use Error::*;
        match self {
            OpenPort { .. }
            | NoHandshakeResponse { .. }
            | SyncRejected { .. }
            | HandshakeIo { .. } => {
                ErrorCategory::Connection
            }
            Io { .. }
            | WriteIncomplete { .. }
            | NoAck
            | NakReceived
            | UnexpectedAckByte { .. }
            | MissingFrameStart { .. }
            | MissingFrameSize
            | FrameTooShort { .. }
            | ChecksumMismatch { .. } => ErrorCategory::Transport,
            InvalidReadResponse { .. } | WriteResponseMismatch { .. } => ErrorCategory::Protocol,
            PayloadTooLarge { .. }
            | InvalidSize { .. }
            | UnknownSensor { .. }
            | NotWritable { .. }
            | DuplicateSensor { .. }
            | ValueOutOfRange { .. } => ErrorCategory::Validation,
            SensorRead { .. } => ErrorCategory::SensorRead,
        }
    }

    /// The error that caused a failed sweep, or `self` for any other variant.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::SensorRead { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(NoAckSnafu.build().category(), ErrorCategory::Transport);
        assert_eq!(
            NoHandshakeResponseSnafu { attempts: 10usize }
                .build()
                .category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            UnknownSensorSnafu { name: "x" }.build().category(),
            ErrorCategory::Validation
        );
        let err = WriteResponseMismatchSnafu {
            address: Address::new(0x6300),
            mismatch: WriteMismatch::WrongSize,
        }
        .build();
        assert_eq!(err.category(), ErrorCategory::Protocol);
    }

    #[test]
    fn test_sensor_read_wraps_cause() {
        let err = Error::SensorRead {
            sensor: "boiler_temp".into(),
            source: Box::new(ChecksumMismatchSnafu {
                computed: 1u8,
                received: 2u8,
            }
            .build()),
        };
        assert_eq!(err.category(), ErrorCategory::SensorRead);
        assert!(matches!(err.root_cause(), Error::ChecksumMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to read sensor \"boiler_temp\": Bad checksum on response (computed 0x01, received 0x02)"
        );
    }
}
