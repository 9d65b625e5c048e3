//! Sensirion SHT4x temperature/humidity sensor over I2C.
//!
//! Every command is a single byte write followed, after the conversion
//! time, by a 6-byte read: two big-endian words each followed by a CRC-8
//! (polynomial 0x31, init 0xFF).
//!
//! | Command | Meaning                                   | Wait    |
//! |---------|-------------------------------------------|---------|
//! | `0xFD`  | measure T + RH, high repeatability        | 10 ms   |
//! | `0x89`  | read serial number                        | 1 ms    |
//! | `0x39`  | heater 200 mW for 1 s, then measure       | 1.1 s   |

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SensorError;

pub const DEFAULT_ADDRESS: u8 = 0x44;

const CMD_MEASURE_HIGH: u8 = 0xFD;
const CMD_SERIAL: u8 = 0x89;
const CMD_HEATER_200MW_1S: u8 = 0x39;

const MEASURE_WAIT_MS: u32 = 10;
const SERIAL_WAIT_MS: u32 = 1;
const HEATER_WAIT_MS: u32 = 1100;

pub struct Sht4x<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> Sht4x<I, D> {
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Measure and convert.  Returns `(°C, %RH)`; humidity is clipped to
    /// the physical 0–100 range as the datasheet recommends.
    pub fn measure(&mut self) -> Result<(f32, f32), SensorError> {
        let (t_raw, rh_raw) = self.command(CMD_MEASURE_HIGH, MEASURE_WAIT_MS)?;
        Ok(convert(t_raw, rh_raw))
    }

    /// Pulse the heater (drives off condensation), discarding the reading
    /// taken at the end of the pulse.
    pub fn heat(&mut self) -> Result<(), SensorError> {
        self.command(CMD_HEATER_200MW_1S, HEATER_WAIT_MS).map(|_| ())
    }

    pub fn serial_number(&mut self) -> Result<u32, SensorError> {
        let (hi, lo) = self.command(CMD_SERIAL, SERIAL_WAIT_MS)?;
        Ok((u32::from(hi) << 16) | u32::from(lo))
    }

    fn command(&mut self, cmd: u8, wait_ms: u32) -> Result<(u16, u16), SensorError> {
        self.i2c
            .write(self.address, &[cmd])
            .map_err(|_| SensorError::BusFault)?;
        self.delay.delay_ms(wait_ms);
        let mut frame = [0u8; 6];
        self.i2c
            .read(self.address, &mut frame)
            .map_err(|_| SensorError::BusFault)?;
        Ok((word(&frame[0..3])?, word(&frame[3..6])?))
    }
}

fn word(chunk: &[u8]) -> Result<u16, SensorError> {
    if crc8(&chunk[..2]) != chunk[2] {
        return Err(SensorError::CrcMismatch);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

fn convert(t_raw: u16, rh_raw: u16) -> (f32, f32) {
    let t = -45.0 + 175.0 * f32::from(t_raw) / 65535.0;
    let rh = -6.0 + 125.0 * f32::from(rh_raw) / 65535.0;
    (t, rh.clamp(0.0, 100.0))
}

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, no reflection.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}
