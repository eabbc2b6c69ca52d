//! See [`Session`] for details.

use log::{debug, info};
use snafu::{ensure, OptionExt, ResultExt};

use crate::config::LinkSettings;
use crate::error::*;
use crate::handshake;
use crate::register;
use crate::sensor::{add_derived_text, Measurements, SensorDefinition, SensorRegistry, Value};
use crate::transaction::Port;

/// State of the link owned by a [`Session`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// The port is open, the handshake hasn't completed.
    Unestablished,
    /// Handshake done, register transactions are possible.
    Ready,
    /// The port has been released. Only set while the session is dropped,
    /// so [`Session::state`] never returns it.
    Closed,
}

/// An established link to the controller.
///
/// A session exclusively owns its port and releases it when dropped, so the
/// device is closed on every exit path. It is meant to be short lived: open
/// one, do a measurement sweep or a single write, and drop it.
///
/// The link is half duplex and single owner. Callers that may run
/// operations concurrently must serialise access to a device path themselves.
///
/// # Example
///
/// ```no_run
/// use optolink_proto::{Session, SensorRegistry};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = SensorRegistry::standard();
/// let mut session = Session::open("/dev/ttyUSB0", &registry)?;
/// let measurements = session.get_measurements()?;
/// println!("boiler: {}", measurements["boiler_temp"]);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Session<'r, P: Port> {
    port: P,
    registry: &'r SensorRegistry,
    state: LinkState,
}

impl<'r> Session<'r, Box<dyn serialport::SerialPort>> {
    /// Open the serial device at `path` with the default [`LinkSettings`] and
    /// establish the link.
    ///
    /// Every failure here is in [`ErrorCategory::Connection`].
    pub fn open(path: &str, registry: &'r SensorRegistry) -> Result<Self> {
        Self::open_with(path, &LinkSettings::default(), registry)
    }

    /// Like [`open`](Self::open), with explicit serial settings.
    ///
    /// The port is closed again if the handshake fails.
    pub fn open_with(
        path: &str,
        settings: &LinkSettings,
        registry: &'r SensorRegistry,
    ) -> Result<Self> {
        debug!("Opening {} with {:?}", path, settings);
        let port = settings
            .builder(path)
            .open()
            .context(OpenPortSnafu { path })?;
        Self::establish(port, registry)
    }
}

impl<'r, P: Port> Session<'r, P> {
    /// Run the handshake over `port` and return a ready session.
    ///
    /// On failure `port` is dropped before the error is returned.
    pub fn establish(port: P, registry: &'r SensorRegistry) -> Result<Self> {
        let mut session = Self {
            port,
            registry,
            state: LinkState::Unestablished,
        };
        // dropping `session` on error closes the port
        handshake::establish(&mut session.port)?;
        session.state = LinkState::Ready;
        info!("Optolink session established");
        Ok(session)
    }

    /// [`LinkState::Ready`] for as long as the session exists.
    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn registry(&self) -> &'r SensorRegistry {
        self.registry
    }

    /// Read every sensor of the registry, plus the derived text fields.
    ///
    /// The sweep is all or nothing: the first failing sensor aborts it with
    /// [`Error::SensorRead`].
    pub fn get_measurements(&mut self) -> Result<Measurements> {
        let registry = self.registry;
        let mut measurements = Measurements::new();
        for sensor in registry.iter() {
            let value = self
                .read_sensor(sensor)
                .context(SensorReadSnafu { sensor: sensor.name })?;
            measurements.insert(sensor.name, value);
        }
        add_derived_text(&mut measurements);
        debug!("Read {} measurements", measurements.len());
        Ok(measurements)
    }

    /// Read and decode a single named sensor.
    pub fn read_value(&mut self, name: &str) -> Result<Value> {
        let registry = self.registry;
        self.read_sensor(registry.lookup(name)?)
    }

    /// Encode `value` for the named sensor and write it.
    ///
    /// # Errors
    /// [`Error::UnknownSensor`], [`Error::NotWritable`] unless the sensor is an
    /// unsigned integer, [`Error::ValueOutOfRange`], or any register write error.
    pub fn write_value(&mut self, name: &str, value: f64) -> Result<()> {
        let registry = self.registry;
        let sensor = registry.lookup(name)?;
        ensure!(
            sensor.encoding.is_writable(),
            NotWritableSnafu { name: sensor.name }
        );
        let data = sensor
            .encoding
            .encode(value)
            .context(ValueOutOfRangeSnafu {
                name: sensor.name,
                value,
            })?;
        info!("Writing {} = {}", sensor.name, value);
        register::write(&mut self.port, sensor.address, &data)
    }

    /// Release the port. Dropping the session does the same.
    pub fn close(self) {
        drop(self);
    }

    fn read_sensor(&mut self, sensor: &SensorDefinition) -> Result<Value> {
        let size = sensor.encoding.size();
        let data = register::read(&mut self.port, sensor.address, size)?;
        // read() returns exactly `size` bytes
        sensor
            .encoding
            .decode(&data)
            .context(InvalidReadResponseSnafu {
                address: sensor.address,
                field: ReadField::Length,
            })
    }
}

impl<P: Port> Drop for Session<'_, P> {
    fn drop(&mut self) {
        let was = self.state;
        self.state = LinkState::Closed;
        if was == LinkState::Ready {
            info!("Optolink session closed");
        } else {
            debug!("Port released in state {:?}", was);
        }
    }
}
