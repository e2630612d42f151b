//! APDS-9960 RGBC color sensor (I2C)
//!
//! Only the ambient light / color engine is used. Gesture and
//! proximity engines stay powered down.
//!
//! Channel data is read in one 8-byte burst starting at CDATAL so the
//! four values come from the same integration cycle:
//! C, R, G, B, each little-endian u16.

use divert_core::traits::{ColorSensor, Rgbc, SensorError};
use embedded_hal::i2c::I2c;

use crate::error::Error;

/// Fixed 7-bit bus address
pub const ADDRESS: u8 = 0x39;

/// Register addresses
pub mod reg {
    /// Power and engine enables
    pub const ENABLE: u8 = 0x80;
    /// ALS integration time
    pub const ATIME: u8 = 0x81;
    /// Gain control
    pub const CONTROL: u8 = 0x8F;
    /// Device ID
    pub const ID: u8 = 0x92;
    /// Clear channel low byte, start of the RGBC block
    pub const CDATAL: u8 = 0x94;
}

/// ENABLE register bits
pub mod enable {
    /// Power on
    pub const PON: u8 = 0x01;
    /// ALS engine enable
    pub const AEN: u8 = 0x02;
}

/// Value of the ID register on a genuine APDS-9960
pub const DEVICE_ID: u8 = 0xAB;

/// Analog gain for the color channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    X1 = 0,
    X4 = 1,
    X16 = 2,
    X64 = 3,
}

/// Sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Apds9960Config {
    /// ATIME register value; integration time is (256 - atime) * 2.78 ms
    pub atime: u8,
    pub gain: Gain,
}

impl Default for Apds9960Config {
    fn default() -> Self {
        Self {
            // 36 cycles, about 100 ms
            atime: 0xDC,
            gain: Gain::X4,
        }
    }
}

/// APDS-9960 driver
pub struct Apds9960<I2C> {
    i2c: I2C,
    config: Apds9960Config,
}

impl<I2C: I2c> Apds9960<I2C> {
    pub fn new(i2c: I2C, config: Apds9960Config) -> Self {
        Self { i2c, config }
    }

    /// Program integration time and gain, then power on the color engine
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(reg::ATIME, self.config.atime)?;
        self.write_reg(reg::CONTROL, self.config.gain as u8)?;
        self.write_reg(reg::ENABLE, enable::PON | enable::AEN)
    }

    /// Read the ID register and check it against [`DEVICE_ID`]
    ///
    /// A mismatch returns [`Error::InvalidData`]; the sensor may still be a
    /// compatible clone, so callers decide whether to carry on.
    pub fn check_id(&mut self) -> Result<u8, Error<I2C::Error>> {
        let id = self.read_reg(reg::ID)?;
        if id != DEVICE_ID {
            return Err(Error::InvalidData);
        }
        Ok(id)
    }

    /// Burst-read the four color channels
    pub fn read_channels(&mut self) -> Result<Rgbc, Error<I2C::Error>> {
        let mut buf = [0u8; 8];
        self.i2c
            .write_read(ADDRESS, &[reg::CDATAL], &mut buf)
            .map_err(Error::Bus)?;

        let word = |i: usize| u16::from_le_bytes([buf[i], buf[i + 1]]);
        Ok(Rgbc {
            c: word(0),
            r: word(2),
            g: word(4),
            b: word(6),
        })
    }

    pub fn config(&self) -> &Apds9960Config {
        &self.config
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(ADDRESS, &[reg, value]).map_err(Error::Bus)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &[reg], &mut buf)
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }
}

impl<I2C: I2c> ColorSensor for Apds9960<I2C> {
    fn read_rgbc(&mut self) -> Result<Rgbc, SensorError> {
        self.read_channels().map_err(|_| SensorError::Bus)
    }
}
