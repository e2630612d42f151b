//! TB6600 belt drive timing
//!
//! The TB6600 is driven by a plain STEP pulse train, so the only logic
//! here is the conversion between belt speed and pulse rate. Enable and
//! direction lines are wired fixed.
//!
//! # Geometry
//!
//! One motor revolution is `full_steps * microsteps` pulses. The motor
//! pinion drives the roller pulley, and one roller revolution moves the
//! belt by its circumference:
//!
//! ```text
//! mm_per_pulse = (pi * roller_d * pinion / pulley) / (full_steps * microsteps)
//! ```
//!
//! All math is done in thousandths of a millimeter.

use divert_core::config::BeltConfig;
use divert_core::traits::BeltSpeedProvider;

/// Belt travel per STEP pulse, in micrometers (mm x 1000)
pub fn mm_per_pulse_x1000(config: &BeltConfig) -> u32 {
    let pulley = u64::from(config.pulley_teeth.max(1));
    let roller_rev_x1000 = u64::from(config.pi_x1000)
        * u64::from(config.roller_diameter_mm)
        * u64::from(config.pinion_teeth)
        / pulley;
    let pulses_per_rev =
        (u64::from(config.full_steps_per_rev) * u64::from(config.microsteps)).max(1);
    (roller_rev_x1000 / pulses_per_rev).min(u64::from(u32::MAX)) as u32
}

/// Pulse rate for a belt speed, rounded to nearest.
///
/// Non-zero speeds always yield at least 1 Hz. A zero speed, or a
/// geometry too fine to resolve, yields 0.
pub fn step_rate_for(mm_per_s: u16, mm_per_pulse_x1000: u32) -> u32 {
    if mm_per_s == 0 || mm_per_pulse_x1000 == 0 {
        return 0;
    }
    let num = u64::from(mm_per_s) * 1000;
    let pulse = u64::from(mm_per_pulse_x1000);
    let rate = (num + pulse / 2) / pulse;
    rate.clamp(1, u64::from(u32::MAX)) as u32
}

/// PWM counter settings for a STEP pulse train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTiming {
    /// Counter wrap value (period is top + 1 counts)
    pub top: u16,
    /// Compare value for a 50% duty pulse
    pub compare: u16,
}

impl StepTiming {
    /// Timing for `rate_hz` on a counter ticking at `counter_hz`.
    ///
    /// Returns `None` when the rate is zero (output stopped). Rates too
    /// slow for a 16-bit counter are clamped to the slowest period.
    pub fn for_rate(rate_hz: u32, counter_hz: u32) -> Option<Self> {
        if rate_hz == 0 {
            return None;
        }
        let period = (counter_hz / rate_hz).clamp(2, u32::from(u16::MAX) + 1);
        let top = (period - 1) as u16;
        Some(Self {
            top,
            compare: (period / 2) as u16,
        })
    }
}

/// Belt drive state: the commanded pulse rate and the speed it achieves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeltDrive {
    mm_per_pulse_x1000: u32,
    step_rate_hz: u32,
    mm_per_s: u16,
    running: bool,
}

impl BeltDrive {
    /// Create a stopped drive set to the configured belt speed
    pub fn new(config: &BeltConfig) -> Self {
        let mut drive = Self {
            mm_per_pulse_x1000: mm_per_pulse_x1000(config),
            step_rate_hz: 0,
            mm_per_s: 0,
            running: false,
        };
        drive.set_speed(config.mm_per_s);
        drive
    }

    /// Set the requested belt speed; returns the resulting pulse rate
    pub fn set_speed(&mut self, mm_per_s: u16) -> u32 {
        self.step_rate_hz = step_rate_for(mm_per_s, self.mm_per_pulse_x1000);
        let achieved =
            u64::from(self.step_rate_hz) * u64::from(self.mm_per_pulse_x1000) / 1000;
        self.mm_per_s = achieved.min(u64::from(u16::MAX)) as u16;
        self.step_rate_hz
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running && self.step_rate_hz > 0
    }

    pub fn step_rate_hz(&self) -> u32 {
        self.step_rate_hz
    }

    pub fn mm_per_pulse_x1000(&self) -> u32 {
        self.mm_per_pulse_x1000
    }

    /// Quantized belt speed actually produced by the pulse rate
    pub fn achieved_mm_per_s(&self) -> u16 {
        self.mm_per_s
    }

    /// PWM settings for the current rate, `None` when stopped
    pub fn timing(&self, counter_hz: u32) -> Option<StepTiming> {
        if !self.is_running() {
            return None;
        }
        StepTiming::for_rate(self.step_rate_hz, counter_hz)
    }
}

impl BeltSpeedProvider for BeltDrive {
    fn mm_per_s(&self) -> u16 {
        self.mm_per_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        // 3142 * 40 * 20 / 50 = 50272 um per roller rev, / 1600 pulses
        assert_eq!(mm_per_pulse_x1000(&BeltConfig::default()), 31);
    }

    #[test]
    fn test_step_rate_rounding() {
        assert_eq!(step_rate_for(55, 31), 1774);
        assert_eq!(step_rate_for(0, 31), 0);
        // 1 mm/s with a coarse pulse still moves
        assert_eq!(step_rate_for(1, 5000), 1);
        assert_eq!(step_rate_for(10, 0), 0);
    }

    #[test]
    fn test_drive_reports_achieved_speed() {
        let drive = BeltDrive::new(&BeltConfig::default());
        assert_eq!(drive.step_rate_hz(), 1774);
        assert_eq!(drive.mm_per_pulse_x1000(), 31);
        assert_eq!(drive.achieved_mm_per_s(), 54);
        assert_eq!(BeltSpeedProvider::mm_per_s(&drive), 54);
    }

    #[test]
    fn test_zero_speed_stops_output() {
        let mut drive = BeltDrive::new(&BeltConfig::default());
        drive.start();
        assert!(drive.timing(1_000_000).is_some());

        assert_eq!(drive.set_speed(0), 0);
        assert_eq!(drive.achieved_mm_per_s(), 0);
        assert!(!drive.is_running());
        assert_eq!(drive.timing(1_000_000), None);
    }

    #[test]
    fn test_timing_requires_start() {
        let mut drive = BeltDrive::new(&BeltConfig::default());
        assert_eq!(drive.timing(1_000_000), None);
        drive.start();
        assert_eq!(
            drive.timing(1_000_000),
            Some(StepTiming {
                top: 562,
                compare: 281
            })
        );
        drive.stop();
        assert_eq!(drive.timing(1_000_000), None);
    }

    #[test]
    fn test_step_timing_bounds() {
        assert_eq!(StepTiming::for_rate(0, 1_000_000), None);
        // Too slow for 16 bits: slowest period
        let slow = StepTiming::for_rate(1, 1_000_000).unwrap();
        assert_eq!(slow.top, u16::MAX);
        // Faster than the counter: shortest usable period
        let fast = StepTiming::for_rate(2_000_000, 1_000_000).unwrap();
        assert_eq!(fast.top, 1);
        assert_eq!(fast.compare, 1);
    }
}
