//! Belt speed source

/// Provides the current belt surface speed
pub trait BeltSpeedProvider {
    /// Belt speed in mm/s; 0 means unknown
    fn mm_per_s(&self) -> u16;
}

/// A fixed speed
impl BeltSpeedProvider for u16 {
    fn mm_per_s(&self) -> u16 {
        *self
    }
}

impl<T: BeltSpeedProvider + ?Sized> BeltSpeedProvider for &T {
    fn mm_per_s(&self) -> u16 {
        (**self).mm_per_s()
    }
}
