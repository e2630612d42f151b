//! Actuate: fire diverters and recenter them after a fixed dwell
//!
//! Each channel has its own dwell deadline. Firing a channel that is
//! already out re-arms its deadline from the new fire time.

pub mod counters;

pub use counters::{CounterSnapshot, Counters};

use crate::config::ActuateConfig;
use crate::decide::{Diverter, TargetPosition};
use crate::traits::{ActuatorOutput, ChannelState, Indicator, Millis, CHANNEL_COUNT};

/// Diverter timer bank
pub struct Actuate<O, I> {
    output: O,
    illumination: I,
    dwell_ms: u32,
    /// Recenter deadline per channel; `None` means centered
    deadlines: [Option<Millis>; CHANNEL_COUNT],
    counters: Counters,
}

impl<O: ActuatorOutput, I: Indicator> Actuate<O, I> {
    pub fn new(output: O, illumination: I, config: &ActuateConfig) -> Self {
        Self {
            output,
            illumination,
            dwell_ms: config.dwell_ms,
            deadlines: [None; CHANNEL_COUNT],
            counters: Counters::new(),
        }
    }

    /// Center all channels, light the sensing area and clear `presence`
    pub fn init<P: Indicator>(&mut self, presence: &mut P) {
        self.stop_all();
        self.illumination.set(true);
        presence.set(false);
    }

    /// Swing the channel for `position` and arm its recenter deadline
    ///
    /// Pass-through has no channel and is ignored.
    pub fn fire(&mut self, position: TargetPosition, now: Millis) -> bool {
        let Some(channel) = position.channel() else {
            return false;
        };
        self.output.set_position(channel, ChannelState::Active);
        self.deadlines[channel] = Some(now.saturating_add(u64::from(self.dwell_ms)));
        true
    }

    /// Recenter every channel whose dwell has elapsed
    ///
    /// Returns the number of channels recentered.
    pub fn tick(&mut self, now: Millis) -> usize {
        let mut recentered = 0;
        for (channel, deadline) in self.deadlines.iter_mut().enumerate() {
            if matches!(*deadline, Some(until) if now >= until) {
                self.output.set_position(channel, ChannelState::Neutral);
                *deadline = None;
                recentered += 1;
            }
        }
        recentered
    }

    /// Center all channels immediately and disarm every deadline
    pub fn stop_all(&mut self) {
        for channel in 0..CHANNEL_COUNT {
            self.output.set_position(channel, ChannelState::Neutral);
        }
        self.deadlines = [None; CHANNEL_COUNT];
    }

    /// Check if `channel` is out and waiting to recenter
    pub fn is_active(&self, channel: usize) -> bool {
        self.deadline(channel).is_some()
    }

    /// Recenter deadline for `channel`
    pub fn deadline(&self, channel: usize) -> Option<Millis> {
        self.deadlines.get(channel).copied().flatten()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }
}

impl<O: ActuatorOutput, I: Indicator> Diverter for Actuate<O, I> {
    fn fire(&mut self, position: TargetPosition, now: Millis) -> bool {
        Actuate::fire(self, position, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    /// Records every output command
    #[derive(Default)]
    struct MockOutput {
        commands: Vec<(usize, ChannelState), 32>,
    }

    impl MockOutput {
        fn last(&self, channel: usize) -> Option<ChannelState> {
            self.commands
                .iter()
                .rev()
                .find(|(ch, _)| *ch == channel)
                .map(|(_, s)| *s)
        }

        fn count(&self, channel: usize, state: ChannelState) -> usize {
            self.commands
                .iter()
                .filter(|c| **c == (channel, state))
                .count()
        }
    }

    impl ActuatorOutput for MockOutput {
        fn set_position(&mut self, channel: usize, state: ChannelState) {
            let _ = self.commands.push((channel, state));
        }
    }

    #[derive(Default)]
    struct MockLed {
        on: bool,
    }

    impl Indicator for MockLed {
        fn set(&mut self, on: bool) {
            self.on = on;
        }
    }

    fn actuate() -> Actuate<MockOutput, MockLed> {
        Actuate::new(
            MockOutput::default(),
            MockLed::default(),
            &ActuateConfig::default(),
        )
    }

    #[test]
    fn test_init() {
        let mut a = actuate();
        let mut presence = MockLed { on: true };
        a.fire(TargetPosition::Pos1, 0);

        a.init(&mut presence);

        assert!(a.illumination.on);
        assert!(!presence.on);
        for ch in 0..CHANNEL_COUNT {
            assert!(!a.is_active(ch));
            assert_eq!(a.output().last(ch), Some(ChannelState::Neutral));
        }
    }

    #[test]
    fn test_fire_arms_deadline() {
        let mut a = actuate();
        assert!(a.fire(TargetPosition::Pos2, 1000));

        assert_eq!(a.output().last(1), Some(ChannelState::Active));
        assert_eq!(a.deadline(1), Some(1250));
        assert!(!a.is_active(0));
        assert!(!a.is_active(2));
    }

    #[test]
    fn test_pass_through_is_noop() {
        let mut a = actuate();
        assert!(!a.fire(TargetPosition::PassThrough, 1000));
        assert!(a.output().commands.is_empty());
    }

    #[test]
    fn test_dwell_then_center_once() {
        let mut a = actuate();
        a.fire(TargetPosition::Pos3, 1000);

        assert_eq!(a.tick(1000), 0);
        assert_eq!(a.tick(1249), 0);
        assert!(a.is_active(2));

        assert_eq!(a.tick(1250), 1);
        assert!(!a.is_active(2));
        assert_eq!(a.output().last(2), Some(ChannelState::Neutral));

        a.tick(1251);
        a.tick(5000);
        assert_eq!(a.output().count(2, ChannelState::Neutral), 1);
    }

    #[test]
    fn test_channels_independent() {
        let mut a = actuate();
        a.fire(TargetPosition::Pos1, 1000);
        a.fire(TargetPosition::Pos2, 1100);

        assert_eq!(a.tick(1250), 1);
        assert!(!a.is_active(0));
        assert!(a.is_active(1));
        assert_eq!(a.tick(1350), 1);
        assert!(!a.is_active(1));
    }

    #[test]
    fn test_refire_extends_dwell() {
        let mut a = actuate();
        a.fire(TargetPosition::Pos1, 1000);
        a.fire(TargetPosition::Pos1, 1200);

        assert_eq!(a.tick(1250), 0);
        assert_eq!(a.tick(1450), 1);
    }

    #[test]
    fn test_deadline_out_of_range() {
        let a = actuate();
        assert_eq!(a.deadline(7), None);
        assert!(!a.is_active(7));
    }

    #[test]
    fn test_fire_through_diverter_trait() {
        fn release<D: Diverter>(d: &mut D) -> bool {
            d.fire(TargetPosition::Pos1, 10)
        }
        let mut a = actuate();
        assert!(release(&mut a));
        assert_eq!(a.deadline(0), Some(260));
    }
}
