//! Configuration type definitions
//!
//! Every tunable of the sorter lives here. `Default` values are the
//! factory settings for the reference machine: 55 mm/s belt, diverters at
//! 120/240/360 mm downstream of the sensing point.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::CHANNEL_COUNT;

/// Fixed capacity of the pending-actuation table
///
/// Bounded so worst-case tick cost is a linear scan over a known length.
pub const SCHED_CAPACITY: usize = 4;

/// Length of the sliding throughput window
pub const THROUGHPUT_WINDOW_MS: u64 = 60_000;

/// Sensing session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SenseConfig {
    /// Color sampling cadence while a session is active (ms)
    pub sample_period_ms: u32,
    /// Session closes after this long without a proximity edge (ms)
    pub quiet_timeout_ms: u32,
    /// Objects shorter than this are SMALL (mm)
    pub small_max_mm: u16,
    /// Averaged clear channel below this marks the result ambiguous
    pub ambiguity_floor: u16,
    /// Belt speed used for length when no runtime speed is known (mm/s)
    pub default_belt_mm_per_s: u16,
}

impl Default for SenseConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 50,
            quiet_timeout_ms: 400,
            small_max_mm: 50,
            ambiguity_floor: 50,
            default_belt_mm_per_s: 55,
        }
    }
}

/// Routing and scheduling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecideConfig {
    /// Belt distance from the sensing point to each diverter (mm, 0 = not fitted)
    pub distances_mm: [u16; CHANNEL_COUNT],
    /// Fire this much earlier than the computed arrival time (ms)
    pub advance_ms: u32,
    /// Minimum time between two firings (ms, 0 disables)
    pub min_spacing_ms: u16,
    /// Maximum accepted schedules per 60 s window (0 disables)
    pub max_blocks_per_min: u8,
}

impl Default for DecideConfig {
    fn default() -> Self {
        Self {
            distances_mm: [120, 240, 360],
            advance_ms: 500,
            min_spacing_ms: 1000,
            max_blocks_per_min: 15,
        }
    }
}

/// Diverter output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActuateConfig {
    /// Hold time before a fired channel recenters (ms)
    pub dwell_ms: u32,
    /// Servo pulse width for the diverting position (us)
    pub active_pulse_us: u16,
    /// Servo pulse width for the centered position (us)
    pub neutral_pulse_us: u16,
    /// Servo outputs stay silent this long after boot (ms)
    pub startup_mute_ms: u32,
}

impl Default for ActuateConfig {
    fn default() -> Self {
        Self {
            dwell_ms: 250,
            active_pulse_us: 1700,
            neutral_pulse_us: 1500,
            startup_mute_ms: 1500,
        }
    }
}

/// Belt drive geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BeltConfig {
    /// Target belt speed (mm/s)
    pub mm_per_s: u16,
    /// Motor full steps per revolution
    pub full_steps_per_rev: u16,
    /// Driver microstep setting
    pub microsteps: u16,
    /// Teeth on the motor pinion
    pub pinion_teeth: u16,
    /// Teeth on the roller pulley
    pub pulley_teeth: u16,
    /// Drive roller diameter (mm)
    pub roller_diameter_mm: u16,
    /// Pi scaled by 1000
    pub pi_x1000: u32,
}

impl Default for BeltConfig {
    fn default() -> Self {
        Self {
            mm_per_s: 55,
            full_steps_per_rev: 200,
            microsteps: 8,
            pinion_teeth: 20,
            pulley_teeth: 50,
            roller_diameter_mm: 40,
            pi_x1000: 3142,
        }
    }
}

/// Proximity sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeConfig {
    /// Interrupt fires when range drops below this (mm)
    pub threshold_mm: u8,
    /// Hysteresis around the threshold (mm)
    pub hysteresis_mm: u8,
    /// Continuous ranging period (ms)
    pub measurement_period_ms: u16,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            threshold_mm: 60,
            hysteresis_mm: 5,
            measurement_period_ms: 50,
        }
    }
}

/// Event log configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TelemetryConfig {
    /// Interval between COUNT snapshots (ms, 0 disables)
    pub count_interval_ms: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            count_interval_ms: 10_000,
        }
    }
}

/// Complete sorter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SorterConfig {
    pub sense: SenseConfig,
    pub decide: DecideConfig,
    pub actuate: ActuateConfig,
    pub belt: BeltConfig,
    pub range: RangeConfig,
    pub telemetry: TelemetryConfig,
}

impl SorterConfig {
    /// Factory configuration
    pub fn new() -> Self {
        Self::default()
    }
}
