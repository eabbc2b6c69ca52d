//! Named sensors on top of raw registers.
//!
//! A [`SensorRegistry`] maps sensor names to a register [`Address`] and an
//! [`Encoding`] describing how the register bytes turn into a [`Value`].

use std::collections::BTreeMap;
use std::fmt;

use arrayvec::ArrayVec;
use snafu::{ensure, OptionExt};

use crate::error::*;
use crate::nom_parser::{le_signed, le_unsigned};
use crate::types::{size, Address, Size};

/// How the bytes of a sensor register are interpreted. All encodings are
/// little-endian.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// Two's complement integer. Read-only.
    SignedInt(Size),
    /// Unsigned integer. The only writable encoding.
    UnsignedInt(Size),
    /// Fixed point value, a signed integer divided by `divisor`. Read-only.
    ScaledFloat(Size, u16),
}

impl Encoding {
    pub const fn size(self) -> Size {
        match self {
            Encoding::SignedInt(size)
            | Encoding::UnsignedInt(size)
            | Encoding::ScaledFloat(size, _) => size,
        }
    }

    pub const fn is_writable(self) -> bool {
        matches!(self, Encoding::UnsignedInt(_))
    }

    /// Decode the register bytes. Returns `None` if `data` is shorter than
    /// the encoding's size.
    pub fn decode(self, data: &[u8]) -> Option<Value> {
        Some(match self {
            Encoding::SignedInt(size) => Value::Int(le_signed(data, size)?),
            Encoding::UnsignedInt(size) => Value::Int(le_unsigned(data, size)? as i64),
            Encoding::ScaledFloat(size, divisor) => {
                Value::Float(le_signed(data, size)? as f64 / f64::from(divisor))
            }
        })
    }

    /// Encode `value` into register bytes. The value is truncated toward
    /// zero first.
    ///
    /// Returns `None` if the encoding isn't writable, or if the truncated
    /// value doesn't fit.
    pub fn encode(self, value: f64) -> Option<ArrayVec<u8, 4>> {
        let size = match self {
            Encoding::UnsignedInt(size) => size,
            _ => return None,
        };
        let value = value.trunc();
        if !value.is_finite() || value < 0.0 || value > size.max_unsigned() as f64 {
            return None;
        }
        let bytes = (value as u64).to_le_bytes();
        Some(bytes[..size.bytes()].iter().copied().collect())
    }
}

/// A named register.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SensorDefinition {
    pub name: &'static str,
    pub address: Address,
    pub encoding: Encoding,
}

impl SensorDefinition {
    pub const fn new(name: &'static str, address: u16, encoding: Encoding) -> Self {
        Self {
            name,
            address: Address::new(address),
            encoding,
        }
    }
}

/// A decoded sensor value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl Value {
    /// The value as an integer, if it has no fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(f as i64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// The result of a measurement sweep, keyed by sensor name.
pub type Measurements = BTreeMap<&'static str, Value>;

/// Operating mode as text.
pub fn mode_to_text(mode: i64) -> &'static str {
    match mode {
        0 => "OFF",
        1 => "Warm Water",
        2 => "Heating & Warm Water",
        _ => "UNKNOWN",
    }
}

/// Position of the three way valve as text.
pub fn valve_to_text(position: i64) -> &'static str {
    match position {
        0 => "Undefined",
        1 => "Heating",
        2 => "Mid Position",
        3 => "Warm Water",
        _ => "UNKNOWN",
    }
}

/// Text fields derived from other sensors: (field name, source sensor, translator).
pub(crate) const DERIVED_TEXT: [(&str, &str, fn(i64) -> &'static str); 2] = [
    ("mode_text", "mode", mode_to_text),
    ("three_way_valve_pos_text", "three_way_valve_pos", valve_to_text),
];

/// Add the derived text fields whose source sensor is present in `measurements`.
pub(crate) fn add_derived_text(measurements: &mut Measurements) {
    for &(field, source, translate) in DERIVED_TEXT.iter() {
        let text = match measurements.get(source) {
            Some(value) => value.as_integer().map_or("UNKNOWN", translate),
            None => continue,
        };
        measurements.insert(field, Value::Text(text));
    }
}

use Encoding::{ScaledFloat as F, SignedInt as S, UnsignedInt as U};

const STANDARD: [SensorDefinition; 30] = [
    SensorDefinition::new("deviceid", 0x00F8, U(size(2))),
    SensorDefinition::new("mode", 0x2323, U(size(1))),
    SensorDefinition::new("outdoor_temp_tp", 0x5525, F(size(2), 10)),
    SensorDefinition::new("outdoor_temp_smooth", 0x5527, F(size(2), 10)),
    SensorDefinition::new("outdoor_temp", 0x0800, F(size(2), 10)),
    SensorDefinition::new("boiler_temp", 0x0802, F(size(2), 10)),
    SensorDefinition::new("boiler_temp_tp", 0x0810, F(size(2), 10)),
    SensorDefinition::new("boiler_target_temp", 0x555A, F(size(2), 10)),
    SensorDefinition::new("flue_gas_temp", 0x0808, F(size(2), 10)),
    SensorDefinition::new("ww_target_temp", 0x6300, U(size(1))),
    SensorDefinition::new("ww_temp", 0x0804, F(size(2), 10)),
    SensorDefinition::new("ww_temp_tp", 0x0812, F(size(2), 10)),
    SensorDefinition::new("ww_offset", 0x6760, F(size(1), 1)),
    SensorDefinition::new("circulation_target_temp", 0x2544, F(size(2), 10)),
    SensorDefinition::new("room_temp", 0x0896, F(size(2), 10)),
    SensorDefinition::new("room_target_temp", 0x2306, F(size(1), 1)),
    SensorDefinition::new("reduced_room_target_temp", 0x2307, F(size(1), 1)),
    SensorDefinition::new("heating_curve_level", 0x27D4, S(size(1))),
    SensorDefinition::new("heating_curve_slope", 0x27D3, F(size(1), 10)),
    SensorDefinition::new("heating_pump_max", 0x27E6, F(size(1), 1)),
    SensorDefinition::new("heating_pump_min", 0x27E7, F(size(1), 1)),
    SensorDefinition::new("starts", 0x088A, U(size(4))),
    SensorDefinition::new("runtime", 0x0886, F(size(4), 1)),
    SensorDefinition::new("power", 0xA38F, F(size(1), 2)),
    SensorDefinition::new("three_way_valve_pos", 0x0A10, F(size(1), 1)),
    SensorDefinition::new("pump_power", 0x0A3C, F(size(1), 1)),
    SensorDefinition::new("flow", 0x0C24, F(size(2), 1)),
    SensorDefinition::new("circ_pump", 0x6515, U(size(1))),
    SensorDefinition::new("h_pump", 0x7663, U(size(1))),
    SensorDefinition::new("ww_pump", 0x6513, U(size(1))),
];

/// An immutable, ordered set of sensor definitions with unique names.
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    sensors: Vec<SensorDefinition>,
}

impl SensorRegistry {
    /// The register map of the Vitodens controller.
    pub fn standard() -> Self {
        Self {
            sensors: STANDARD.to_vec(),
        }
    }

    /// Build a registry from custom definitions.
    /// # Errors
    /// Returns [`Error::DuplicateSensor`] if a name occurs twice.
    pub fn new(sensors: impl IntoIterator<Item = SensorDefinition>) -> Result<Self> {
        let sensors: Vec<SensorDefinition> = sensors.into_iter().collect();
        for (i, sensor) in sensors.iter().enumerate() {
            ensure!(
                sensors[..i].iter().all(|s| s.name != sensor.name),
                DuplicateSensorSnafu { name: sensor.name }
            );
        }
        Ok(Self { sensors })
    }

    pub fn get(&self, name: &str) -> Option<&SensorDefinition> {
        self.sensors.iter().find(|s| s.name == name)
    }

    /// Like [`get`](Self::get), failing with [`Error::UnknownSensor`].
    pub fn lookup(&self, name: &str) -> Result<&SensorDefinition> {
        self.get(name).context(UnknownSensorSnafu { name })
    }

    /// Sensors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SensorDefinition> {
        self.sensors.iter()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
