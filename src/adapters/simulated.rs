//! Simulated dry box for host runs without the `rpi` feature.
//!
//! A deterministic humidity model: the chamber gains moisture while the fan
//! is off and dries twice as fast while it runs, so a default config
//! cycles the fan every minute or so.  The room drifts slowly in a
//! triangle wave.  Every installed device answers its probe.

use log::debug;

use super::console_display::ConsoleDisplay;
use crate::app::ports::{DevicePort, DisplayPort, FanPort, SensorPort};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::{Reading, Zone};
use crate::snapshot::StatusSnapshot;

const KNOWN_DEVICES: [&str; 3] = ["SHT41_Internal", "SHT41_Ambient", "EMC2101"];

const HUMIDITY_RISE: f32 = 0.3;
const HUMIDITY_FALL: f32 = 0.6;

pub struct SimulatedHardware {
    display: ConsoleDisplay,
    internal_humidity: f32,
    ambient_step: u32,
    fan_speed: u8,
    ambient_fitted: bool,
}

impl SimulatedHardware {
    pub fn new(display: ConsoleDisplay, ambient_fitted: bool) -> Self {
        Self {
            display,
            internal_humidity: 50.0,
            ambient_step: 0,
            fan_speed: 0,
            ambient_fitted,
        }
    }

    pub fn fan_speed(&self) -> u8 {
        self.fan_speed
    }
}

impl SensorPort for SimulatedHardware {
    fn read_reading(&mut self, zone: Zone) -> Result<Reading, SensorError> {
        match zone {
            Zone::Internal => {
                let delta = if self.fan_speed > 0 {
                    -HUMIDITY_FALL
                } else {
                    HUMIDITY_RISE
                };
                self.internal_humidity = (self.internal_humidity + delta).clamp(0.0, 100.0);
                Ok(Reading::rounded(24.0, self.internal_humidity))
            }
            Zone::Ambient if self.ambient_fitted => {
                self.ambient_step = (self.ambient_step + 1) % 40;
                let tri = if self.ambient_step < 20 {
                    self.ambient_step
                } else {
                    40 - self.ambient_step
                } as f32;
                Ok(Reading::rounded(20.0 + tri * 0.1, 45.0 + tri * 0.5))
            }
            Zone::Ambient => Err(SensorError::NotFitted),
        }
    }

    fn heat(&mut self, zone: Zone) -> Result<(), SensorError> {
        debug!("sim: {} heater pulse", zone);
        Ok(())
    }
}

impl FanPort for SimulatedHardware {
    fn set_fan_speed(&mut self, percent: u8) -> Result<(), ActuatorError> {
        if percent > 100 {
            return Err(ActuatorError::OutOfRange(percent));
        }
        self.fan_speed = percent;
        Ok(())
    }
}

impl DisplayPort for SimulatedHardware {
    fn render(&mut self, snapshot: &StatusSnapshot) {
        self.display.render(snapshot);
    }

    fn render_border_message(&mut self, text: &str) {
        self.display.render_border_message(text);
    }

    fn clear(&mut self) {
        self.display.clear();
    }
}

impl DevicePort for SimulatedHardware {
    fn probe(&mut self, device: &str) -> Result<String, SensorError> {
        match device {
            "SHT41_Ambient" if !self.ambient_fitted => Err(SensorError::NotDetected),
            d if KNOWN_DEVICES.contains(&d) => Ok("simulated".into()),
            _ => Err(SensorError::NotDetected),
        }
    }
}
