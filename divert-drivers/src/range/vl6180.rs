//! VL6180 time-of-flight proximity sensor (I2C)
//!
//! Registers use 16-bit big-endian addresses. The sensor runs in
//! continuous ranging mode and pulls GPIO1 low whenever a measurement
//! falls below the configured low threshold, which is what opens and
//! sustains a detection session. Every interrupt must be cleared before
//! the next one can assert.

use divert_core::traits::RangeSensor;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::Error;

/// Fixed 7-bit bus address
pub const ADDRESS: u8 = 0x29;

/// Settle time after power-up before the first register access
pub const BOOT_DELAY_MS: u32 = 200;

/// Register addresses
pub mod reg {
    pub const SYSTEM_MODE_GPIO1: u16 = 0x011;
    pub const SYSTEM_INTERRUPT_CONFIG_GPIO: u16 = 0x014;
    pub const SYSTEM_INTERRUPT_CLEAR: u16 = 0x015;
    pub const SYSTEM_FRESH_OUT_OF_RESET: u16 = 0x016;
    pub const SYSRANGE_START: u16 = 0x018;
    pub const SYSRANGE_THRESH_HIGH: u16 = 0x019;
    pub const SYSRANGE_THRESH_LOW: u16 = 0x01A;
    pub const SYSRANGE_INTERMEASUREMENT_PERIOD: u16 = 0x01B;
    pub const RESULT_INTERRUPT_STATUS_GPIO: u16 = 0x04F;
    pub const RESULT_RANGE_VAL: u16 = 0x062;
}

/// GPIO1 as interrupt output, active low
const GPIO1_INTERRUPT_ACTIVE_LOW: u8 = 0x10;
/// Clear range, ALS and error interrupts
const CLEAR_ALL: u8 = 0x07;
/// Range source, level-low threshold event
const RANGE_LOW_THRESHOLD: u8 = 0x21;
const START_CONTINUOUS: u8 = 0x03;

/// Private tuning registers required after every reset
const TUNING: [(u16, u8); 31] = [
    (0x0207, 0x01),
    (0x0208, 0x01),
    (0x0096, 0x00),
    (0x0097, 0xFD),
    (0x00E3, 0x00),
    (0x00E4, 0x04),
    (0x00E5, 0x02),
    (0x00E6, 0x01),
    (0x00E7, 0x03),
    (0x00F5, 0x02),
    (0x00D9, 0x05),
    (0x00DB, 0xCE),
    (0x00DC, 0x03),
    (0x00DD, 0xF8),
    (0x009F, 0x00),
    (0x00A3, 0x3C),
    (0x00B7, 0x00),
    (0x00BB, 0x3C),
    (0x00B2, 0x09),
    (0x00CA, 0x09),
    (0x0198, 0x01),
    (0x01B0, 0x17),
    (0x01AD, 0x00),
    (0x00FF, 0x05),
    (0x0100, 0x05),
    (0x0199, 0x05),
    (0x01A6, 0x1B),
    (0x01AC, 0x3E),
    (0x01A7, 0x1F),
    (0x0030, 0x00),
    (0x0011, 0x10),
];

/// Raw interrupt status and last range result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeReading {
    pub status: u8,
    pub range_mm: u8,
}

/// Convert a measurement period to the register encoding (10 ms units, minus one)
pub fn intermeasurement_code(period_ms: u16) -> u8 {
    if period_ms < 10 {
        return 0;
    }
    let raw = (period_ms / 10).saturating_sub(1);
    raw.min(u8::MAX as u16) as u8
}

/// VL6180 driver
pub struct Vl6180<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Vl6180<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Boot the sensor: clear the reset flag, load tuning, route GPIO1
    /// and set the ranging period. Ranging is not started here.
    pub fn init<D: DelayNs>(
        &mut self,
        delay: &mut D,
        period_ms: u16,
    ) -> Result<(), Error<I2C::Error>> {
        delay.delay_ms(BOOT_DELAY_MS);

        if self.read_reg(reg::SYSTEM_FRESH_OUT_OF_RESET)? != 0 {
            self.write_reg(reg::SYSTEM_FRESH_OUT_OF_RESET, 0x00)?;
        }

        for (addr, value) in TUNING {
            self.write_reg(addr, value)?;
        }

        self.write_reg(reg::SYSTEM_MODE_GPIO1, GPIO1_INTERRUPT_ACTIVE_LOW)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, CLEAR_ALL)?;
        self.write_reg(
            reg::SYSRANGE_INTERMEASUREMENT_PERIOD,
            intermeasurement_code(period_ms),
        )
    }

    /// Arm the low-threshold interrupt and start continuous ranging.
    ///
    /// Ranging starts last so the first measurement produces a clean edge.
    pub fn configure_threshold(&mut self, low_mm: u8) -> Result<(), Error<I2C::Error>> {
        self.write_reg(reg::SYSRANGE_THRESH_LOW, low_mm)?;
        self.write_reg(reg::SYSRANGE_THRESH_HIGH, 0xFF)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CONFIG_GPIO, RANGE_LOW_THRESHOLD)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, CLEAR_ALL)?;
        self.write_reg(reg::SYSRANGE_START, START_CONTINUOUS)
    }

    pub fn clear_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, CLEAR_ALL)
    }

    pub fn read_status_range(&mut self) -> Result<RangeReading, Error<I2C::Error>> {
        let status = self.read_reg(reg::RESULT_INTERRUPT_STATUS_GPIO)?;
        let range_mm = self.read_reg(reg::RESULT_RANGE_VAL)?;
        Ok(RangeReading { status, range_mm })
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_reg(&mut self, reg: u16, value: u8) -> Result<(), Error<I2C::Error>> {
        let [hi, lo] = reg.to_be_bytes();
        self.i2c.write(ADDRESS, &[hi, lo, value]).map_err(Error::Bus)
    }

    fn read_reg(&mut self, reg: u16) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &reg.to_be_bytes(), &mut buf)
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }
}

impl<I2C: I2c> RangeSensor for Vl6180<I2C> {
    fn acknowledge(&mut self) {
        // Best effort: a missed clear only delays the next edge
        let _ = self.read_status_range();
        let _ = self.clear_interrupt();
    }
}
