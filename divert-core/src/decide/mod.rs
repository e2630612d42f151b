//! Decide: route, schedule and release diverter actuations
//!
//! Accepted actuations wait in a fixed-capacity slot table until their due
//! time. Scheduling never looks at spacing, so closely following objects
//! can all be accepted; minimum spacing is enforced in [`Decide::tick`],
//! where it delays a firing instead of rejecting it.

pub mod guardrail;
pub mod router;

pub use guardrail::Guardrails;
pub use router::{route, TargetPosition};

use crate::config::{DecideConfig, SCHED_CAPACITY};
use crate::traits::{BeltSpeedProvider, Millis, CHANNEL_COUNT};

/// Identifier linking all log entries for one physical object
pub type CorrelationId = u32;

/// Why a schedule request was refused
///
/// Rejections are routine outcomes, not faults: the object simply passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScheduleReject {
    /// Routed to pass-through; nothing to fire
    PassThrough,
    /// Diverter distance or belt speed is zero
    InvalidConfig,
    /// Throughput window already full
    Throughput,
    /// No free slot
    QueueFull,
}

impl ScheduleReject {
    /// Stable reason code used in the event log
    pub const fn reason(self) -> &'static str {
        match self {
            ScheduleReject::PassThrough => "pass-through",
            ScheduleReject::InvalidConfig => "invalid-config",
            ScheduleReject::Throughput => "throughput",
            ScheduleReject::QueueFull => "queue-full",
        }
    }
}

/// A pending actuation; a slot holding one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleItem {
    /// Fire at or after this time (ms)
    pub due_ms: Millis,
    pub position: TargetPosition,
    pub id: CorrelationId,
}

/// Record of an actuation released by [`Decide::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Firing {
    pub position: TargetPosition,
    pub id: CorrelationId,
    /// Time the item was due
    pub due_ms: Millis,
    /// Time it actually fired
    pub fired_ms: Millis,
}

/// Receiver of released actuations
pub trait Diverter {
    /// Swing the diverter for `position`
    ///
    /// Returns `false` if the position has no diverter.
    fn fire(&mut self, position: TargetPosition, now: Millis) -> bool;
}

/// Scheduler with guardrails
#[derive(Debug, Clone)]
pub struct Decide {
    slots: [Option<ScheduleItem>; SCHED_CAPACITY],
    guard: Guardrails,
    distances_mm: [u16; CHANNEL_COUNT],
    advance_ms: u32,
    belt_mm_per_s: u16,
    last_due_ms: Millis,
}

impl Decide {
    /// Create a scheduler
    ///
    /// `belt_mm_per_s` is the initial belt speed; 0 leaves scheduling
    /// disabled until a speed is set.
    pub fn new(config: &DecideConfig, belt_mm_per_s: u16) -> Self {
        Self {
            slots: [None; SCHED_CAPACITY],
            guard: Guardrails::new(config.min_spacing_ms, config.max_blocks_per_min),
            distances_mm: config.distances_mm,
            advance_ms: config.advance_ms,
            belt_mm_per_s,
            last_due_ms: 0,
        }
    }

    /// Drop all pending items and forget the last firing
    ///
    /// Guardrail limits and the belt speed are kept.
    pub fn init(&mut self) {
        self.slots = [None; SCHED_CAPACITY];
        self.guard.clear_actuation();
        self.last_due_ms = 0;
    }

    fn distance_for(&self, position: TargetPosition) -> u16 {
        position.channel().map_or(0, |ch| self.distances_mm[ch])
    }

    /// Due time for an object detected at `detect_ms`
    ///
    /// Travel delay is truncated to whole milliseconds. The advance is
    /// applied only when the delay exceeds it, so the result is never
    /// before `detect_ms`.
    fn due_time(&self, distance_mm: u16, detect_ms: Millis) -> Millis {
        let delay = u64::from(distance_mm) * 1000 / u64::from(self.belt_mm_per_s);
        let advance = u64::from(self.advance_ms);
        if delay > advance {
            detect_ms.saturating_add(delay - advance)
        } else {
            detect_ms
        }
    }

    /// Request an actuation at `position` for an object detected at `detect_ms`
    ///
    /// Returns the due time on acceptance. A request that passes the
    /// throughput check consumes window budget even if the table is full.
    pub fn schedule(
        &mut self,
        position: TargetPosition,
        detect_ms: Millis,
        id: CorrelationId,
    ) -> Result<Millis, ScheduleReject> {
        if position == TargetPosition::PassThrough {
            return Err(ScheduleReject::PassThrough);
        }

        let distance = self.distance_for(position);
        if distance == 0 || self.belt_mm_per_s == 0 {
            return Err(ScheduleReject::InvalidConfig);
        }

        let due_ms = self.due_time(distance, detect_ms);

        if !self.guard.admit(detect_ms) {
            return Err(ScheduleReject::Throughput);
        }

        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.is_none())
            .ok_or(ScheduleReject::QueueFull)?;

        *slot = Some(ScheduleItem {
            due_ms,
            position,
            id,
        });
        self.last_due_ms = due_ms;
        Ok(due_ms)
    }

    /// Release at most one due actuation
    ///
    /// Picks the earliest due item; equal due times go to the lowest slot.
    /// Does nothing while the spacing guardrail is holding.
    pub fn tick<D: Diverter>(&mut self, now: Millis, diverter: &mut D) -> Option<Firing> {
        if self.guard.spacing_blocks(now) {
            return None;
        }

        let mut best: Option<(usize, ScheduleItem)> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(item) = slot {
                if item.due_ms <= now && best.map_or(true, |(_, b)| item.due_ms < b.due_ms) {
                    best = Some((i, *item));
                }
            }
        }

        let (index, item) = best?;
        diverter.fire(item.position, now);
        self.slots[index] = None;
        self.guard.record_actuation(now);

        Some(Firing {
            position: item.position,
            id: item.id,
            due_ms: item.due_ms,
            fired_ms: now,
        })
    }

    /// Number of active slots
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Active slot contents, by slot index
    pub fn slots(&self) -> &[Option<ScheduleItem>; SCHED_CAPACITY] {
        &self.slots
    }

    /// Due time of the most recently accepted schedule
    pub fn last_due_ms(&self) -> Millis {
        self.last_due_ms
    }

    pub fn guardrails(&self) -> &Guardrails {
        &self.guard
    }

    /// Set minimum spacing between firings (ms, 0 disables)
    pub fn set_min_spacing_ms(&mut self, ms: u16) {
        self.guard.set_min_spacing_ms(ms);
    }

    /// Set the throughput limit (0 disables)
    pub fn set_max_blocks_per_min(&mut self, max: u8) {
        self.guard.set_max_blocks_per_min(max);
    }

    /// Override the belt speed; 0 is ignored
    pub fn set_belt_mm_per_s(&mut self, mm_per_s: u16) {
        if mm_per_s > 0 {
            self.belt_mm_per_s = mm_per_s;
        }
    }

    pub fn belt_mm_per_s(&self) -> u16 {
        self.belt_mm_per_s
    }

    pub fn distances_mm(&self) -> [u16; CHANNEL_COUNT] {
        self.distances_mm
    }
}

impl BeltSpeedProvider for Decide {
    fn mm_per_s(&self) -> u16 {
        self.belt_mm_per_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    /// Records every fire command
    #[derive(Default)]
    struct MockDiverter {
        fired: Vec<(TargetPosition, Millis), 16>,
    }

    impl Diverter for MockDiverter {
        fn fire(&mut self, position: TargetPosition, now: Millis) -> bool {
            let _ = self.fired.push((position, now));
            true
        }
    }

    /// Guardrails off, no advance, 100 mm/s
    fn open_config() -> DecideConfig {
        DecideConfig {
            distances_mm: [120, 240, 360],
            advance_ms: 0,
            min_spacing_ms: 0,
            max_blocks_per_min: 0,
        }
    }

    #[test]
    fn test_due_time_with_advance() {
        let config = DecideConfig {
            advance_ms: 500,
            ..open_config()
        };
        let mut d = Decide::new(&config, 100);

        assert_eq!(d.schedule(TargetPosition::Pos2, 1000, 1), Ok(2900));
        assert_eq!(d.last_due_ms(), 2900);
    }

    #[test]
    fn test_advance_clamped_to_detect_time() {
        let config = DecideConfig {
            advance_ms: 5000,
            ..open_config()
        };
        let mut d = Decide::new(&config, 100);

        assert_eq!(d.schedule(TargetPosition::Pos1, 1000, 1), Ok(1000));
    }

    #[test]
    fn test_delay_truncates() {
        let mut d = Decide::new(&open_config(), 55);
        // 120 * 1000 / 55 = 2181.8
        assert_eq!(d.schedule(TargetPosition::Pos1, 0, 1), Ok(2181));
    }

    #[test]
    fn test_reject_pass_through() {
        let mut d = Decide::new(&open_config(), 100);
        assert_eq!(
            d.schedule(TargetPosition::PassThrough, 1000, 1),
            Err(ScheduleReject::PassThrough)
        );
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn test_reject_invalid_config() {
        let config = DecideConfig {
            distances_mm: [0, 240, 360],
            ..open_config()
        };
        let mut d = Decide::new(&config, 100);
        assert_eq!(
            d.schedule(TargetPosition::Pos1, 1000, 1),
            Err(ScheduleReject::InvalidConfig)
        );

        let mut d = Decide::new(&open_config(), 0);
        assert_eq!(
            d.schedule(TargetPosition::Pos2, 1000, 1),
            Err(ScheduleReject::InvalidConfig)
        );
    }

    #[test]
    fn test_reject_throughput() {
        let config = DecideConfig {
            max_blocks_per_min: 2,
            ..open_config()
        };
        let mut d = Decide::new(&config, 100);

        assert!(d.schedule(TargetPosition::Pos1, 1000, 1).is_ok());
        assert!(d.schedule(TargetPosition::Pos1, 2000, 2).is_ok());
        assert_eq!(
            d.schedule(TargetPosition::Pos1, 3000, 3),
            Err(ScheduleReject::Throughput)
        );
        assert_eq!(ScheduleReject::Throughput.reason(), "throughput");
    }

    #[test]
    fn test_reject_queue_full() {
        let mut d = Decide::new(&open_config(), 100);
        for id in 0..SCHED_CAPACITY as u32 {
            assert!(d.schedule(TargetPosition::Pos3, 1000, id).is_ok());
        }
        assert_eq!(
            d.schedule(TargetPosition::Pos3, 1000, 99),
            Err(ScheduleReject::QueueFull)
        );
        assert_eq!(d.pending(), SCHED_CAPACITY);
    }

    #[test]
    fn test_round_trip() {
        let mut d = Decide::new(&open_config(), 100);
        let mut diverter = MockDiverter::default();

        let due = d.schedule(TargetPosition::Pos2, 1000, 7).unwrap();
        assert_eq!(due, 3400);

        assert!(d.tick(due - 1, &mut diverter).is_none());
        let firing = d.tick(due, &mut diverter).unwrap();
        assert_eq!(firing.position, TargetPosition::Pos2);
        assert_eq!(firing.id, 7);
        assert_eq!(firing.fired_ms, due);
        assert_eq!(d.pending(), 0);

        assert!(d.tick(due, &mut diverter).is_none());
        assert!(d.tick(due + 10_000, &mut diverter).is_none());
        assert_eq!(diverter.fired.len(), 1);
    }

    #[test]
    fn test_earliest_due_fires_first() {
        let mut d = Decide::new(&open_config(), 100);
        let mut diverter = MockDiverter::default();

        // Pos3 at 0 is due 3600, Pos1 at 1000 is due 2200
        d.schedule(TargetPosition::Pos3, 0, 1).unwrap();
        d.schedule(TargetPosition::Pos1, 1000, 2).unwrap();

        assert_eq!(d.tick(5000, &mut diverter).unwrap().id, 2);
        assert_eq!(d.tick(5000, &mut diverter).unwrap().id, 1);
    }

    #[test]
    fn test_equal_due_lowest_slot_wins() {
        let mut d = Decide::new(&open_config(), 100);
        let mut diverter = MockDiverter::default();

        d.schedule(TargetPosition::Pos1, 1000, 10).unwrap();
        d.schedule(TargetPosition::Pos1, 1000, 11).unwrap();
        d.schedule(TargetPosition::Pos1, 1000, 12).unwrap();

        assert_eq!(d.tick(2200, &mut diverter).unwrap().id, 10);
        assert_eq!(d.tick(2200, &mut diverter).unwrap().id, 11);

        // Freed slot 0 is reused; its item still ties with slot 2
        d.schedule(TargetPosition::Pos1, 1000, 13).unwrap();
        assert_eq!(d.slots()[0].unwrap().id, 13);
        assert_eq!(d.tick(2200, &mut diverter).unwrap().id, 13);
    }

    #[test]
    fn test_spacing_defers_firing() {
        let config = DecideConfig {
            min_spacing_ms: 500,
            ..open_config()
        };
        // 120 mm at 120 mm/s: due one second after detection
        let mut d = Decide::new(&config, 120);
        let mut diverter = MockDiverter::default();

        d.schedule(TargetPosition::Pos1, 0, 1).unwrap();
        d.schedule(TargetPosition::Pos1, 200, 2).unwrap();

        assert_eq!(d.tick(1000, &mut diverter).unwrap().id, 1);
        assert!(d.tick(1200, &mut diverter).is_none());
        assert!(d.tick(1499, &mut diverter).is_none());
        assert_eq!(d.pending(), 1);

        let next = d.tick(1600, &mut diverter).unwrap();
        assert_eq!(next.id, 2);
        assert_eq!(next.due_ms, 1200);
        assert_eq!(next.fired_ms, 1600);
        assert_eq!(
            diverter.fired.as_slice(),
            &[(TargetPosition::Pos1, 1000), (TargetPosition::Pos1, 1600)]
        );
    }

    #[test]
    fn test_idle_tick_changes_nothing() {
        let mut d = Decide::new(&open_config(), 100);
        let mut diverter = MockDiverter::default();
        d.schedule(TargetPosition::Pos1, 1000, 1).unwrap();

        let before = d.clone();
        assert!(d.tick(1500, &mut diverter).is_none());
        assert_eq!(d.slots(), before.slots());
        assert_eq!(d.guardrails(), before.guardrails());
        assert!(diverter.fired.is_empty());
    }

    #[test]
    fn test_zero_belt_override_ignored() {
        let mut d = Decide::new(&open_config(), 100);
        d.set_belt_mm_per_s(0);
        assert_eq!(d.belt_mm_per_s(), 100);
        d.set_belt_mm_per_s(80);
        assert_eq!(d.mm_per_s(), 80);
    }

    #[test]
    fn test_init_clears_slots() {
        let mut d = Decide::new(&open_config(), 100);
        let mut diverter = MockDiverter::default();
        d.schedule(TargetPosition::Pos1, 0, 1).unwrap();
        d.schedule(TargetPosition::Pos2, 0, 2).unwrap();
        d.tick(1200, &mut diverter);

        d.init();
        assert_eq!(d.pending(), 0);
        assert_eq!(d.last_due_ms(), 0);
        assert_eq!(d.guardrails().last_actuation_ms(), None);
    }
}
