//! Object length from dwell time and belt speed

use crate::traits::Millis;

/// Length class used for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LengthClass {
    Small,
    NotSmall,
}

impl LengthClass {
    pub const fn label(self) -> &'static str {
        match self {
            LengthClass::Small => "Small",
            LengthClass::NotSmall => "NotSmall",
        }
    }
}

/// Length derived from one detection session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LengthInfo {
    /// Time the object occupied the sensing point (ms)
    pub dwell_ms: Millis,
    /// Estimated length (mm)
    pub length_mm: u16,
    pub class: LengthClass,
}

/// Compute length from a dwell interval
///
/// The dwell is floored to whole seconds before multiplying by the belt
/// speed, so any dwell under one second measures 0 mm. Results beyond
/// `u16::MAX` saturate.
pub fn compute_length(
    t_enter: Millis,
    t_exit: Millis,
    belt_mm_per_s: u16,
    small_max_mm: u16,
) -> LengthInfo {
    let dwell_ms = t_exit.saturating_sub(t_enter);
    let mm = (dwell_ms / 1000).saturating_mul(u64::from(belt_mm_per_s));
    let length_mm = u16::try_from(mm).unwrap_or(u16::MAX);
    let class = if length_mm < small_max_mm {
        LengthClass::Small
    } else {
        LengthClass::NotSmall
    };

    LengthInfo {
        dwell_ms,
        length_mm,
        class,
    }
}
