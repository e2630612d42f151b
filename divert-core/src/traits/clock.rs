//! Monotonic time source

/// Milliseconds since boot
///
/// 64 bits wide so the counter never wraps during the life of the machine.
pub type Millis = u64;

/// Monotonic millisecond clock
///
/// Implemented by the board on top of its timer driver. The core only reads
/// from it; time is passed explicitly into every state machine operation.
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> Millis;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}
