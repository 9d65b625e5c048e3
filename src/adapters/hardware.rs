//! Hardware adapter: bridges the real peripherals to the domain ports.
//!
//! Owns the [`SensorHub`], the EMC2101 fan controller and the panel, and
//! exposes them through [`SensorPort`], [`FanPort`], [`DisplayPort`] and
//! [`DevicePort`].  Generic over the bus types so the same adapter runs
//! against `/dev/i2c-*` on the Pi (`rpi` feature) and against fakes in
//! tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::console_display::ConsoleDisplay;
use crate::app::ports::{DevicePort, DisplayPort, FanPort, SensorPort};
use crate::drivers::emc2101::Emc2101;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::{Reading, SensorHub, Zone};
use crate::snapshot::StatusSnapshot;

pub struct HardwareAdapter<SI, FI, D> {
    sensors: SensorHub<SI, D>,
    fan: Emc2101<FI>,
    display: ConsoleDisplay,
}

impl<SI: I2c, FI: I2c, D: DelayNs> HardwareAdapter<SI, FI, D> {
    pub fn new(sensors: SensorHub<SI, D>, fan: Emc2101<FI>, display: ConsoleDisplay) -> Self {
        Self {
            sensors,
            fan,
            display,
        }
    }
}

// ── SensorPort ────────────────────────────────────────────────

impl<SI: I2c, FI: I2c, D: DelayNs> SensorPort for HardwareAdapter<SI, FI, D> {
    fn read_reading(&mut self, zone: Zone) -> Result<Reading, SensorError> {
        self.sensors.read(zone)
    }

    fn heat(&mut self, zone: Zone) -> Result<(), SensorError> {
        self.sensors.heat(zone)
    }
}

// ── FanPort ───────────────────────────────────────────────────

impl<SI: I2c, FI: I2c, D: DelayNs> FanPort for HardwareAdapter<SI, FI, D> {
    fn set_fan_speed(&mut self, percent: u8) -> Result<(), ActuatorError> {
        self.fan.set_speed(percent)
    }
}

// ── DisplayPort ───────────────────────────────────────────────

impl<SI: I2c, FI: I2c, D: DelayNs> DisplayPort for HardwareAdapter<SI, FI, D> {
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

// ── DevicePort ────────────────────────────────────────────────

impl<SI: I2c, FI: I2c, D: DelayNs> DevicePort for HardwareAdapter<SI, FI, D> {
    fn probe(&mut self, device: &str) -> Result<String, SensorError> {
        match device {
            "SHT41_Internal" => self
                .sensors
                .serial(Zone::Internal)
                .map(|s| format!("serial {:08X}", s)),
            "SHT41_Ambient" => self
                .sensors
                .serial(Zone::Ambient)
                .map(|s| format!("serial {:08X}", s)),
            // init() also switches the controller to direct fan setting.
            "EMC2101" => self.fan.init().map(|p| format!("product 0x{:02X}", p)),
            _ => Err(SensorError::NotDetected),
        }
    }
}

// ── Raspberry Pi wiring ───────────────────────────────────────

#[cfg(feature = "rpi")]
pub mod rpi {
    use anyhow::Context;
    use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
    use linux_embedded_hal::{CdevPin, Delay, I2cdev};

    use super::HardwareAdapter;
    use crate::adapters::console_display::ConsoleDisplay;
    use crate::config::SystemConfig;
    use crate::drivers::button::{ButtonSource, ButtonTiming};
    use crate::drivers::emc2101::{self, Emc2101};
    use crate::events::ButtonId;
    use crate::sensors::SensorHub;
    use crate::sensors::sht4x::{self, Sht4x};

    pub type PiHardware = HardwareAdapter<I2cdev, I2cdev, Delay>;

    fn open_bus(path: &str) -> anyhow::Result<I2cdev> {
        I2cdev::new(path).with_context(|| format!("opening I2C bus {path}"))
    }

    pub fn open_hardware(config: &SystemConfig) -> anyhow::Result<PiHardware> {
        let internal = Sht4x::new(
            open_bus(&config.internal_i2c_bus)?,
            Delay,
            sht4x::DEFAULT_ADDRESS,
        );
        let ambient = if config.ambient_sensor_enabled {
            Some(Sht4x::new(
                open_bus(&config.ambient_i2c_bus)?,
                Delay,
                sht4x::DEFAULT_ADDRESS,
            ))
        } else {
            None
        };
        let fan = Emc2101::new(open_bus(&config.fan_i2c_bus)?, emc2101::DEFAULT_ADDRESS);
        Ok(HardwareAdapter::new(
            SensorHub::new(internal, ambient),
            fan,
            ConsoleDisplay::new(config.temperature_unit),
        ))
    }

    pub fn open_buttons(config: &SystemConfig) -> anyhow::Result<ButtonSource<CdevPin>> {
        let mut chip = Chip::new(&config.gpio_chip)
            .with_context(|| format!("opening {}", config.gpio_chip))?;
        let mut source = ButtonSource::new(ButtonTiming {
            debounce_ms: config.debounce_ms,
            hold_ms: config.hold_ms,
            active_low: config.buttons_active_low,
        });
        let pins = config.button_pins;
        for (id, offset) in [
            (ButtonId::Left, pins.left),
            (ButtonId::Right, pins.right),
            (ButtonId::Up, pins.up),
            (ButtonId::Down, pins.down),
            (ButtonId::A, pins.a),
            (ButtonId::B, pins.b),
        ] {
            let handle = chip
                .get_line(offset)
                .and_then(|line| line.request(LineRequestFlags::INPUT, 0, "drybox"))
                .with_context(|| format!("requesting GPIO {offset} for button {id}"))?;
            let pin = CdevPin::new(handle)
                .with_context(|| format!("configuring GPIO {offset} for button {id}"))?;
            if source.add(id, pin).is_err() {
                anyhow::bail!("too many buttons");
            }
        }
        Ok(source)
    }
}
