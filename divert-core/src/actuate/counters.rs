//! Operational counters

use crate::traits::Color;

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterSnapshot {
    /// Objects detected
    pub total: u32,
    /// Objects with an accepted actuation
    pub diverted: u32,
    /// Objects left on the belt
    pub passed: u32,
    /// Objects needing manual handling
    pub fault: u32,
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub other: u32,
}

/// Monotonic counters, each advanced independently
///
/// Counters saturate at `u32::MAX`. Keeping `total == diverted + passed + fault`
/// is up to the caller.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    values: CounterSnapshot,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            values: CounterSnapshot {
                total: 0,
                diverted: 0,
                passed: 0,
                fault: 0,
                red: 0,
                green: 0,
                blue: 0,
                other: 0,
            },
        }
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        self.values = CounterSnapshot::default();
    }

    pub fn inc_total(&mut self) {
        self.values.total = self.values.total.saturating_add(1);
    }

    pub fn inc_diverted(&mut self) {
        self.values.diverted = self.values.diverted.saturating_add(1);
    }

    pub fn inc_passed(&mut self) {
        self.values.passed = self.values.passed.saturating_add(1);
    }

    pub fn inc_fault(&mut self) {
        self.values.fault = self.values.fault.saturating_add(1);
    }

    pub fn inc_red(&mut self) {
        self.values.red = self.values.red.saturating_add(1);
    }

    pub fn inc_green(&mut self) {
        self.values.green = self.values.green.saturating_add(1);
    }

    pub fn inc_blue(&mut self) {
        self.values.blue = self.values.blue.saturating_add(1);
    }

    pub fn inc_other(&mut self) {
        self.values.other = self.values.other.saturating_add(1);
    }

    /// Advance the counter matching `color`
    pub fn inc_color(&mut self, color: Color) {
        match color {
            Color::Red => self.inc_red(),
            Color::Green => self.inc_green(),
            Color::Blue => self.inc_blue(),
            Color::Other => self.inc_other(),
        }
    }

    /// Read-only copy of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        self.values
    }
}
