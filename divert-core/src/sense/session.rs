//! Detection session bookkeeping

use crate::traits::{Millis, Rgbc};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Nothing in front of the sensor
    #[default]
    Idle,
    /// Object present; color samples are being accumulated
    Active,
}

/// One object's passage past the sensing point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetectEvent {
    /// Session is open
    pub present: bool,
    /// First proximity edge (ms)
    pub t_enter: Millis,
    /// Last proximity edge before the quiet timeout (ms)
    pub t_exit: Millis,
}

impl DetectEvent {
    /// Time between the first and last edge
    pub fn dwell_ms(&self) -> Millis {
        self.t_exit.saturating_sub(self.t_enter)
    }
}

/// Running per-channel sums of color samples for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorAccumulator {
    sum_r: u64,
    sum_g: u64,
    sum_b: u64,
    sum_c: u64,
    count: u16,
}

impl ColorAccumulator {
    pub const fn new() -> Self {
        Self {
            sum_r: 0,
            sum_g: 0,
            sum_b: 0,
            sum_c: 0,
            count: 0,
        }
    }

    /// Clear all sums
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fold in one sample
    ///
    /// Once the count saturates further samples are dropped so the sums
    /// and the count stay consistent.
    pub fn add(&mut self, sample: Rgbc) {
        if self.count == u16::MAX {
            return;
        }
        self.sum_r += u64::from(sample.r);
        self.sum_g += u64::from(sample.g);
        self.sum_b += u64::from(sample.b);
        self.sum_c += u64::from(sample.c);
        self.count += 1;
    }

    /// Number of samples accumulated
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Per-channel mean, or `None` if no samples were taken
    pub fn average(&self) -> Option<Rgbc> {
        if self.count == 0 {
            return None;
        }
        let n = u64::from(self.count);
        // Mean of u16 samples always fits in u16
        let mean = |sum: u64| (sum / n) as u16;
        Some(Rgbc::new(
            mean(self.sum_r),
            mean(self.sum_g),
            mean(self.sum_b),
            mean(self.sum_c),
        ))
    }
}
