//! Property tests for the scheduling and timing invariants
//!
//! Host only; the core itself stays `no_std`.

use divert_core::actuate::Actuate;
use divert_core::config::{ActuateConfig, DecideConfig, SCHED_CAPACITY, THROUGHPUT_WINDOW_MS};
use divert_core::decide::{Decide, Diverter, TargetPosition};
use divert_core::sense::{compute_length, LengthClass};
use divert_core::traits::{ActuatorOutput, ChannelState, Indicator, CHANNEL_COUNT};
use divert_core::Millis;
use proptest::prelude::*;

#[derive(Default)]
struct Recorder {
    fired: Vec<Millis>,
}

impl Diverter for Recorder {
    fn fire(&mut self, _position: TargetPosition, now: Millis) -> bool {
        self.fired.push(now);
        true
    }
}

#[derive(Default)]
struct Servos {
    state: [Option<ChannelState>; CHANNEL_COUNT],
    neutral_commands: [u32; CHANNEL_COUNT],
}

impl ActuatorOutput for Servos {
    fn set_position(&mut self, channel: usize, state: ChannelState) {
        self.state[channel] = Some(state);
        if state == ChannelState::Neutral {
            self.neutral_commands[channel] += 1;
        }
    }
}

struct Lamp;

impl Indicator for Lamp {
    fn set(&mut self, _on: bool) {}
}

fn arb_position() -> impl Strategy<Value = TargetPosition> {
    prop_oneof![
        Just(TargetPosition::Pos1),
        Just(TargetPosition::Pos2),
        Just(TargetPosition::Pos3),
    ]
}

fn arb_config() -> impl Strategy<Value = DecideConfig> {
    (
        proptest::array::uniform3(0u16..=2000),
        0u32..=5000,
        0u16..=3000,
        0u8..=20,
    )
        .prop_map(
            |(distances_mm, advance_ms, min_spacing_ms, max_blocks_per_min)| DecideConfig {
                distances_mm,
                advance_ms,
                min_spacing_ms,
                max_blocks_per_min,
            },
        )
}

proptest! {
    /// An accepted actuation is never due before its detection.
    #[test]
    fn due_never_before_detect(
        config in arb_config(),
        belt in 0u16..=1000,
        position in arb_position(),
        detect in 0u64..=10_000_000,
    ) {
        let mut decide = Decide::new(&config, belt);
        if let Ok(due) = decide.schedule(position, detect, 1) {
            prop_assert!(due >= detect);
            prop_assert_eq!(decide.last_due_ms(), due);
        }
    }

    /// Firings are never closer together than the minimum spacing.
    #[test]
    fn firings_respect_spacing(
        min_spacing in 1u16..=2000,
        requests in proptest::collection::vec((arb_position(), 0u64..=20_000), 1..=12),
        tick_step in 1u64..=50,
    ) {
        let config = DecideConfig {
            distances_mm: [120, 240, 360],
            advance_ms: 500,
            min_spacing_ms: min_spacing,
            max_blocks_per_min: 0,
        };
        let mut decide = Decide::new(&config, 55);
        let mut recorder = Recorder::default();

        for (i, (position, detect)) in requests.iter().enumerate() {
            let _ = decide.schedule(*position, *detect, i as u32);
        }

        let mut now = 0;
        while now <= 60_000 {
            decide.tick(now, &mut recorder);
            now += tick_step;
        }

        for pair in recorder.fired.windows(2) {
            prop_assert!(pair[1] - pair[0] >= u64::from(min_spacing));
        }
        prop_assert_eq!(decide.pending(), 0);
    }

    /// Each throughput window accepts at most the configured maximum.
    ///
    /// The window is fixed, not rolling: it opens at the first request after
    /// the previous window expired and resets 60 s later. Any 60 s span that
    /// straddles a reset may hold up to twice the maximum.
    #[test]
    fn throughput_bounded_per_window(
        max in 1u8..=10,
        detects in proptest::collection::vec(0u64..=200_000, 1..=60),
    ) {
        let mut detects = detects;
        detects.sort_unstable();
        let config = DecideConfig {
            distances_mm: [120, 240, 360],
            advance_ms: 0,
            min_spacing_ms: 0,
            max_blocks_per_min: max,
        };
        let mut decide = Decide::new(&config, 100);
        let mut recorder = Recorder::default();

        let mut accepted = Vec::new();
        for (i, detect) in detects.iter().enumerate() {
            if decide.schedule(TargetPosition::Pos1, *detect, i as u32).is_ok() {
                accepted.push(*detect);
            }
            // Keep the table drained so only the window can reject
            while decide.tick(Millis::MAX, &mut recorder).is_some() {}
        }

        // A window opens at the first acceptance after the previous one expired
        let mut i = 0;
        while i < accepted.len() {
            let start = accepted[i];
            let in_window = accepted[i..]
                .iter()
                .take_while(|t| **t < start + THROUGHPUT_WINDOW_MS)
                .count();
            prop_assert!(in_window <= usize::from(max));
            i += in_window;
        }
    }

    /// The table never holds more than its capacity.
    #[test]
    fn table_bounded(
        requests in proptest::collection::vec((arb_position(), 0u64..=1_000), 0..=20),
    ) {
        let config = DecideConfig {
            max_blocks_per_min: 0,
            ..DecideConfig::default()
        };
        let mut decide = Decide::new(&config, 55);
        let mut accepted = 0;
        for (i, (position, detect)) in requests.iter().enumerate() {
            if decide.schedule(*position, *detect, i as u32).is_ok() {
                accepted += 1;
            }
            prop_assert!(decide.pending() <= SCHED_CAPACITY);
        }
        prop_assert_eq!(decide.pending(), accepted.min(SCHED_CAPACITY));
    }

    /// A tick with nothing due leaves the scheduler untouched.
    #[test]
    fn idle_tick_is_noop(
        requests in proptest::collection::vec((arb_position(), 1_000u64..=5_000), 1..=4),
        now in 0u64..1_000,
    ) {
        let config = DecideConfig {
            advance_ms: 0,
            ..DecideConfig::default()
        };
        let mut decide = Decide::new(&config, 55);
        for (i, (position, detect)) in requests.iter().enumerate() {
            let _ = decide.schedule(*position, *detect, i as u32);
        }

        let before = decide.clone();
        let mut recorder = Recorder::default();
        prop_assert!(decide.tick(now, &mut recorder).is_none());
        prop_assert_eq!(decide.slots(), before.slots());
        prop_assert_eq!(decide.guardrails(), before.guardrails());
        prop_assert!(recorder.fired.is_empty());
    }

    /// A fired channel stays out for the full dwell and recenters exactly once.
    #[test]
    fn dwell_symmetry(
        dwell in 1u32..=5_000,
        fire_at in 0u64..=100_000,
        position in arb_position(),
        probe in 0u64..=10_000,
    ) {
        let config = ActuateConfig { dwell_ms: dwell, ..ActuateConfig::default() };
        let mut actuate = Actuate::new(Servos::default(), Lamp, &config);
        let channel = position.channel().unwrap_or_default();

        actuate.fire(position, fire_at);
        let deadline = fire_at + u64::from(dwell);

        let before = fire_at + probe % u64::from(dwell);
        actuate.tick(before);
        prop_assert!(actuate.is_active(channel));
        prop_assert_eq!(actuate.output().state[channel], Some(ChannelState::Active));

        actuate.tick(deadline + probe);
        actuate.tick(deadline + probe + 1);
        prop_assert!(!actuate.is_active(channel));
        prop_assert_eq!(actuate.output().neutral_commands[channel], 1);
    }

    /// Length classes split exactly at the threshold.
    #[test]
    fn length_threshold_split(
        belt in 1u16..=500,
        seconds in 0u64..=20,
        extra_ms in 0u64..1000,
        threshold in 1u16..=2000,
    ) {
        let info = compute_length(0, seconds * 1000 + extra_ms, belt, threshold);
        prop_assert_eq!(u64::from(info.length_mm), seconds * u64::from(belt));
        let expected = if info.length_mm < threshold {
            LengthClass::Small
        } else {
            LengthClass::NotSmall
        };
        prop_assert_eq!(info.class, expected);
    }
}
