//! Serial line settings.

use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortBuilder, StopBits};

/// Parameters of the serial line to the Optolink adapter.
///
/// The default is the only setting the controller understands:
/// 4800 baud, 8 data bits, even parity, 2 stop bits, no flow control,
/// and a 5 second read timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Upper bound on every single read.
    pub timeout: Duration,
}

impl LinkSettings {
    /// A port builder for `path` with these settings applied.
    pub fn builder<'a>(&self, path: impl Into<std::borrow::Cow<'a, str>>) -> SerialPortBuilder {
        serialport::new(path, self.baud_rate)
            .data_bits(self.data_bits)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .flow_control(self.flow_control)
            .timeout(self.timeout)
    }

    /// Override the read timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: 4800,
            data_bits: DataBits::Eight,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            flow_control: FlowControl::None,
            timeout: Duration::from_secs(5),
        }
    }
}
