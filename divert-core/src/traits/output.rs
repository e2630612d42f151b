//! Output traits: indicator lamps and diverter actuators

/// Number of physical diverter channels
pub const CHANNEL_COUNT: usize = 3;

/// Commanded state of one diverter channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Paddle swung across the belt
    Active,
    /// Paddle centered, belt unobstructed
    Neutral,
}

/// Binary indicator output (LED, lamp)
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Diverter actuator bank
///
/// Implementations translate the commanded state into a drive signal
/// (servo pulse width, solenoid level). Must not block.
pub trait ActuatorOutput {
    /// Command `channel` (0-based, less than [`CHANNEL_COUNT`]) to `state`
    ///
    /// Out-of-range channels are ignored.
    fn set_position(&mut self, channel: usize, state: ChannelState);
}
