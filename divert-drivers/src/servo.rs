//! Servo diverter bank
//!
//! Three hobby servos on a 50 Hz frame. Each diverter has two positions:
//! the active pulse swings the paddle across the belt, the neutral pulse
//! parks it clear.
//!
//! The bank starts muted: outputs are held fully low so the servos do not
//! twitch while the rest of the board powers up. Position commands made
//! while muted are remembered and applied on [`ServoBank::unmute`].

use divert_core::config::ActuateConfig;
use divert_core::traits::{ActuatorOutput, ChannelState, CHANNEL_COUNT};
use embedded_hal::pwm::SetDutyCycle;

/// Servo frame length
pub const FRAME_US: u16 = 20_000;

/// PWM-driven servo bank
pub struct ServoBank<P> {
    channels: [P; CHANNEL_COUNT],
    states: [ChannelState; CHANNEL_COUNT],
    active_pulse_us: u16,
    neutral_pulse_us: u16,
    muted: bool,
}

impl<P: SetDutyCycle> ServoBank<P> {
    /// Create a muted bank. Outputs are driven low immediately.
    pub fn new(channels: [P; CHANNEL_COUNT], config: &ActuateConfig) -> Self {
        let mut bank = Self {
            channels,
            states: [ChannelState::Neutral; CHANNEL_COUNT],
            active_pulse_us: config.active_pulse_us,
            neutral_pulse_us: config.neutral_pulse_us,
            muted: true,
        };
        bank.mute();
        bank
    }

    /// Hold all outputs low
    pub fn mute(&mut self) {
        self.muted = true;
        for ch in self.channels.iter_mut() {
            let _ = ch.set_duty_cycle_fully_off();
        }
    }

    /// Resume pulses at the last commanded positions
    pub fn unmute(&mut self) {
        self.muted = false;
        for channel in 0..CHANNEL_COUNT {
            self.apply(channel);
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Last commanded state of a channel
    pub fn state(&self, channel: usize) -> Option<ChannelState> {
        self.states.get(channel).copied()
    }

    /// Pulse width for a state
    pub fn pulse_us(&self, state: ChannelState) -> u16 {
        match state {
            ChannelState::Active => self.active_pulse_us,
            ChannelState::Neutral => self.neutral_pulse_us,
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&P> {
        self.channels.get(channel)
    }

    fn apply(&mut self, channel: usize) {
        if self.muted {
            return;
        }
        let pulse = self.pulse_us(self.states[channel]).min(FRAME_US);
        // Output errors are not recoverable mid-frame; the next command retries
        let _ = self.channels[channel].set_duty_cycle_fraction(pulse, FRAME_US);
    }
}

impl<P: SetDutyCycle> ActuatorOutput for ServoBank<P> {
    fn set_position(&mut self, channel: usize, state: ChannelState) {
        if channel >= CHANNEL_COUNT {
            return;
        }
        self.states[channel] = state;
        self.apply(channel);
    }
}
