//! Microchip EMC2101 fan controller over I2C (address 0x4C).
//!
//! Only the direct-setting path is used: the look-up table is disabled so
//! the FAN_SETTING register drives the PWM output.  Speed is given in
//! percent and scaled onto the 6-bit register range.

use embedded_hal::i2c::I2c;
use log::info;

use crate::error::{ActuatorError, SensorError};

pub const DEFAULT_ADDRESS: u8 = 0x4C;

const REG_FAN_CONFIG: u8 = 0x4A;
const REG_FAN_SETTING: u8 = 0x4C;
const REG_PRODUCT_ID: u8 = 0xFD;
const REG_MANUFACTURER_ID: u8 = 0xFE;

/// FAN_CONFIG bit 5: program the fan from FAN_SETTING instead of the LUT.
const FAN_CONFIG_LUT_DISABLE: u8 = 0x20;
const MAX_FAN_SETTING: u16 = 0x3F;

const MANUFACTURER_SMSC: u8 = 0x5D;
const PRODUCT_EMC2101: u8 = 0x16;
const PRODUCT_EMC2101_R: u8 = 0x28;

pub struct Emc2101<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Emc2101<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Verify the chip identity and switch to direct fan setting.
    pub fn init(&mut self) -> Result<u8, SensorError> {
        let product = self.probe()?;
        let config = self.read_reg(REG_FAN_CONFIG)?;
        self.write_reg(REG_FAN_CONFIG, config | FAN_CONFIG_LUT_DISABLE)
            .map_err(|_| SensorError::BusFault)?;
        info!("EMC2101: product 0x{:02X}, manual fan control", product);
        Ok(product)
    }

    /// Read manufacturer and product IDs.  Returns the product ID.
    pub fn probe(&mut self) -> Result<u8, SensorError> {
        let manufacturer = self.read_reg(REG_MANUFACTURER_ID)?;
        let product = self.read_reg(REG_PRODUCT_ID)?;
        if manufacturer != MANUFACTURER_SMSC
            || !matches!(product, PRODUCT_EMC2101 | PRODUCT_EMC2101_R)
        {
            return Err(SensorError::NotDetected);
        }
        Ok(product)
    }

    pub fn set_speed(&mut self, percent: u8) -> Result<(), ActuatorError> {
        if percent > 100 {
            return Err(ActuatorError::OutOfRange(percent));
        }
        let setting = (u16::from(percent) * MAX_FAN_SETTING / 100) as u8;
        self.write_reg(REG_FAN_SETTING, setting)
            .map_err(|_| ActuatorError::BusFault)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| SensorError::BusFault)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[reg, value])
    }
}
