//! Sensor subsystem: zone readings and the aggregating [`SensorHub`].
//!
//! The dry box has two measurement zones: the chamber itself (`Internal`)
//! and the room around it (`Ambient`).  Each zone is served by one SHT4x
//! on its own I2C bus; the ambient sensor is optional.

pub mod sht4x;

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use serde::{Deserialize, Serialize};

use crate::error::SensorError;
use sht4x::Sht4x;

/// Physical sensor location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Internal,
    Ambient,
}

impl Zone {
    pub const ALL: [Zone; 2] = [Zone::Internal, Zone::Ambient];

    /// Stable array index for per-zone tables.
    pub const fn index(self) -> usize {
        match self {
            Self::Internal => 0,
            Self::Ambient => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::Ambient => "Ambient",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One temperature/humidity sample.  Values carry one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity: f32,
}

impl Reading {
    /// Build a reading rounded to one decimal place, as displayed and logged.
    pub fn rounded(temperature_c: f32, humidity: f32) -> Self {
        Self {
            temperature_c: round_tenth(temperature_c),
            humidity: round_tenth(humidity),
        }
    }
}

fn round_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Owns the zone sensors.
pub struct SensorHub<I, D> {
    internal: Sht4x<I, D>,
    ambient: Option<Sht4x<I, D>>,
}

impl<I: I2c, D: DelayNs> SensorHub<I, D> {
    pub fn new(internal: Sht4x<I, D>, ambient: Option<Sht4x<I, D>>) -> Self {
        Self { internal, ambient }
    }

    fn sensor(&mut self, zone: Zone) -> Result<&mut Sht4x<I, D>, SensorError> {
        match zone {
            Zone::Internal => Ok(&mut self.internal),
            Zone::Ambient => self.ambient.as_mut().ok_or(SensorError::NotFitted),
        }
    }

    pub fn read(&mut self, zone: Zone) -> Result<Reading, SensorError> {
        let (t, rh) = self.sensor(zone)?.measure()?;
        Ok(Reading::rounded(t, rh))
    }

    pub fn heat(&mut self, zone: Zone) -> Result<(), SensorError> {
        self.sensor(zone)?.heat()
    }

    /// Serial number of the sensor in `zone`, used for startup detection.
    pub fn serial(&mut self, zone: Zone) -> Result<u32, SensorError> {
        self.sensor(zone)?.serial_number()
    }
}
