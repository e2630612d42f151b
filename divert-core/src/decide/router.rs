//! Color and length to diverter position

use crate::sense::LengthClass;
use crate::traits::Color;

/// Where an object should leave the belt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetPosition {
    Pos1,
    Pos2,
    Pos3,
    /// Stay on the belt
    PassThrough,
}

impl TargetPosition {
    /// Diverter channel index, `None` for pass-through
    pub const fn channel(self) -> Option<usize> {
        match self {
            TargetPosition::Pos1 => Some(0),
            TargetPosition::Pos2 => Some(1),
            TargetPosition::Pos3 => Some(2),
            TargetPosition::PassThrough => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TargetPosition::Pos1 => "Pos1",
            TargetPosition::Pos2 => "Pos2",
            TargetPosition::Pos3 => "Pos3",
            TargetPosition::PassThrough => "PassThrough",
        }
    }
}

/// Route a classified object
///
/// Only small red, green and blue objects are diverted.
pub const fn route(color: Color, class: LengthClass) -> TargetPosition {
    match (class, color) {
        (LengthClass::Small, Color::Red) => TargetPosition::Pos1,
        (LengthClass::Small, Color::Green) => TargetPosition::Pos2,
        (LengthClass::Small, Color::Blue) => TargetPosition::Pos3,
        _ => TargetPosition::PassThrough,
    }
}
