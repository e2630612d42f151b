//! Mechanical and throughput guardrails
//!
//! Two independent policies:
//! - Minimum spacing between physical firings, checked at fire time
//! - A 60 s throughput window on accepted schedules, checked at schedule time

use crate::config::THROUGHPUT_WINDOW_MS;
use crate::traits::Millis;

/// Guardrail state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Guardrails {
    /// Minimum time between firings (ms, 0 disables)
    min_spacing_ms: u16,
    /// Accepted schedules per window (0 disables)
    max_blocks_per_min: u8,
    /// Time of the most recent firing
    last_actuation_ms: Option<Millis>,
    /// Start of the open throughput window
    window_start_ms: Option<Millis>,
    /// Schedules accepted in the open window
    blocks_in_window: u8,
}

impl Guardrails {
    pub const fn new(min_spacing_ms: u16, max_blocks_per_min: u8) -> Self {
        Self {
            min_spacing_ms,
            max_blocks_per_min,
            last_actuation_ms: None,
            window_start_ms: None,
            blocks_in_window: 0,
        }
    }

    /// Check if a firing at `now` would violate minimum spacing
    pub fn spacing_blocks(&self, now: Millis) -> bool {
        if self.min_spacing_ms == 0 {
            return false;
        }
        match self.last_actuation_ms {
            Some(last) => now < last.saturating_add(u64::from(self.min_spacing_ms)),
            None => false,
        }
    }

    /// Count a schedule request against the throughput window
    ///
    /// Returns `false` if the window is already full. The window is keyed on
    /// detection time and restarts once 60 s have elapsed since it opened.
    pub fn admit(&mut self, detect_ms: Millis) -> bool {
        if self.max_blocks_per_min == 0 {
            return true;
        }

        let expired = match self.window_start_ms {
            Some(start) => detect_ms.saturating_sub(start) >= THROUGHPUT_WINDOW_MS,
            None => true,
        };
        if expired {
            self.window_start_ms = Some(detect_ms);
            self.blocks_in_window = 0;
        }

        if self.blocks_in_window >= self.max_blocks_per_min {
            return false;
        }
        self.blocks_in_window += 1;
        true
    }

    pub fn record_actuation(&mut self, now: Millis) {
        self.last_actuation_ms = Some(now);
    }

    /// Forget the last firing; the throughput window is kept
    pub fn clear_actuation(&mut self) {
        self.last_actuation_ms = None;
    }

    pub fn last_actuation_ms(&self) -> Option<Millis> {
        self.last_actuation_ms
    }

    pub fn min_spacing_ms(&self) -> u16 {
        self.min_spacing_ms
    }

    pub fn set_min_spacing_ms(&mut self, ms: u16) {
        self.min_spacing_ms = ms;
    }

    pub fn max_blocks_per_min(&self) -> u8 {
        self.max_blocks_per_min
    }

    pub fn set_max_blocks_per_min(&mut self, max: u8) {
        self.max_blocks_per_min = max;
    }

    pub fn blocks_in_window(&self) -> u8 {
        self.blocks_in_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_disabled() {
        let mut g = Guardrails::new(0, 0);
        g.record_actuation(1000);
        assert!(!g.spacing_blocks(1000));
    }

    #[test]
    fn test_spacing_without_prior_firing() {
        let g = Guardrails::new(500, 0);
        assert!(!g.spacing_blocks(0));
    }

    #[test]
    fn test_spacing_window() {
        let mut g = Guardrails::new(500, 0);
        g.record_actuation(1000);
        assert!(g.spacing_blocks(1000));
        assert!(g.spacing_blocks(1499));
        assert!(!g.spacing_blocks(1500));
    }

    #[test]
    fn test_first_firing_at_time_zero_counts() {
        let mut g = Guardrails::new(500, 0);
        g.record_actuation(0);
        assert!(g.spacing_blocks(100));
    }

    #[test]
    fn test_throughput_limit() {
        let mut g = Guardrails::new(0, 2);
        assert!(g.admit(1000));
        assert!(g.admit(2000));
        assert!(!g.admit(3000));
        assert_eq!(g.blocks_in_window(), 2);
    }

    #[test]
    fn test_throughput_window_resets() {
        let mut g = Guardrails::new(0, 1);
        assert!(g.admit(1000));
        assert!(!g.admit(60_999));
        assert!(g.admit(61_000));
        assert!(!g.admit(61_001));
    }

    #[test]
    fn test_throughput_window_is_fixed() {
        // The window opened at 1000 and resets at 61_000, so three requests
        // land inside the 60 s span 2000..62_000
        let mut g = Guardrails::new(0, 2);
        assert!(g.admit(1000));
        assert!(g.admit(2000));
        assert!(!g.admit(3000));
        assert!(g.admit(61_000));
        assert!(g.admit(62_000 - 1));
        assert!(!g.admit(62_000));
    }

    #[test]
    fn test_throughput_disabled() {
        let mut g = Guardrails::new(0, 0);
        for t in 0..100 {
            assert!(g.admit(t));
        }
    }
}
