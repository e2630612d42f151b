//! Driver error type

/// Errors from bus-attached drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Underlying bus error
    Bus(E),
    /// Device answered with an unexpected identity or value
    InvalidData,
}
