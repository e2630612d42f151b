//! Sense: presence edges and color samples in, one classified result per object out
//!
//! A session opens on the first proximity edge while idle and closes once no
//! edge has arrived for the quiet timeout. While open, the color sensor is
//! sampled on a fixed cadence and the samples are averaged at close.
//!
//! Every [`Sense::poll`] runs three steps in a fixed order: drain at most one
//! edge, take a color sample if due, then check for end of session. The edge
//! that opens a session resets the quiet timer, so one poll never both opens
//! and closes a session.

pub mod classify;
pub mod length;
pub mod session;

pub use classify::RatioClassifier;
pub use length::{compute_length, LengthClass, LengthInfo};
pub use session::{ColorAccumulator, DetectEvent, SessionState};

use crate::config::SenseConfig;
use crate::traits::{
    BeltSpeedProvider, Color, ColorClassifier, ColorSensor, EdgeSource, Indicator, Millis,
    RangeSensor, Rgbc,
};

/// Finalized result for one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SenseResult {
    pub event: DetectEvent,
    pub length: LengthInfo,
    pub color: Color,
    /// Too little light to trust the color verdict
    pub ambiguous: bool,
    /// Channel values the verdict was computed from
    pub rgbc: Rgbc,
    /// Samples behind `rgbc` (1 for a successful fallback read, 0 if it failed)
    pub samples: u16,
}

/// Detection session tracker
pub struct Sense<E, R, C, P, K = RatioClassifier> {
    edges: E,
    range: R,
    color: C,
    presence: P,
    classifier: K,
    config: SenseConfig,
    state: SessionState,
    event: DetectEvent,
    last_edge_ms: Millis,
    last_sample_ms: Millis,
    accum: ColorAccumulator,
}

impl<E, R, C, P> Sense<E, R, C, P, RatioClassifier>
where
    E: EdgeSource,
    R: RangeSensor,
    C: ColorSensor,
    P: Indicator,
{
    /// Create a tracker using the ratio classifier
    pub fn new(edges: E, range: R, color: C, presence: P, config: SenseConfig) -> Self {
        Self::with_classifier(edges, range, color, presence, RatioClassifier, config)
    }
}

impl<E, R, C, P, K> Sense<E, R, C, P, K>
where
    E: EdgeSource,
    R: RangeSensor,
    C: ColorSensor,
    P: Indicator,
    K: ColorClassifier,
{
    /// Create a tracker with a custom classifier
    pub fn with_classifier(
        edges: E,
        range: R,
        color: C,
        presence: P,
        classifier: K,
        config: SenseConfig,
    ) -> Self {
        Self {
            edges,
            range,
            color,
            presence,
            classifier,
            config,
            state: SessionState::Idle,
            event: DetectEvent::default(),
            last_edge_ms: 0,
            last_sample_ms: 0,
            accum: ColorAccumulator::new(),
        }
    }

    /// Reset to idle; sampling cadence restarts from `now`
    pub fn init(&mut self, now: Millis) {
        self.state = SessionState::Idle;
        self.event = DetectEvent::default();
        self.last_edge_ms = 0;
        self.last_sample_ms = now;
        self.accum.reset();
    }

    /// Advance the session state machine
    ///
    /// Returns a result exactly once per closed session. `belt` supplies the
    /// speed used for length; 0 falls back to the configured default.
    pub fn poll<B: BeltSpeedProvider>(&mut self, now: Millis, belt: &B) -> Option<SenseResult> {
        if self.edges.take() {
            self.range.acknowledge();
            self.last_edge_ms = now;
            if self.state == SessionState::Idle {
                self.start_session(now);
            }
        }

        if self.state == SessionState::Active
            && now.saturating_sub(self.last_sample_ms) >= u64::from(self.config.sample_period_ms)
        {
            if let Ok(sample) = self.color.read_rgbc() {
                self.accum.add(sample);
            }
            self.last_sample_ms = now;
        }

        if self.should_end(now) {
            self.end_session();
            return Some(self.finalize(belt.mm_per_s()));
        }

        None
    }

    fn start_session(&mut self, now: Millis) {
        self.state = SessionState::Active;
        self.event = DetectEvent {
            present: true,
            t_enter: now,
            t_exit: now,
        };
        self.accum.reset();
        self.presence.set(true);
    }

    fn should_end(&self, now: Millis) -> bool {
        self.state == SessionState::Active
            && now.saturating_sub(self.last_edge_ms) > u64::from(self.config.quiet_timeout_ms)
    }

    /// Close at the last edge time, not `now`, so timeout slack stays out of the dwell
    fn end_session(&mut self) {
        self.state = SessionState::Idle;
        self.event.present = false;
        self.event.t_exit = self.last_edge_ms;
        self.presence.set(false);
    }

    fn finalize(&mut self, belt_mm_per_s: u16) -> SenseResult {
        let belt = match belt_mm_per_s {
            0 => self.config.default_belt_mm_per_s,
            v => v,
        };
        let length = compute_length(
            self.event.t_enter,
            self.event.t_exit,
            belt,
            self.config.small_max_mm,
        );

        let (rgbc, samples) = match self.accum.average() {
            Some(avg) => (avg, self.accum.count()),
            None => match self.color.read_rgbc() {
                Ok(sample) => (sample, 1),
                Err(_) => (Rgbc::default(), 0),
            },
        };

        SenseResult {
            event: self.event,
            length,
            color: self.classifier.classify(rgbc),
            ambiguous: rgbc.c < self.config.ambiguity_floor,
            rgbc,
            samples,
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if a session is open
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The open (or most recently closed) detection
    pub fn current_event(&self) -> DetectEvent {
        self.event
    }

    /// Samples accumulated so far in the open session
    pub fn sample_count(&self) -> u16 {
        self.accum.count()
    }

    /// Time of the most recent proximity edge
    pub fn last_edge_ms(&self) -> Millis {
        self.last_edge_ms
    }

    pub fn config(&self) -> &SenseConfig {
        &self.config
    }

    /// Presence indicator, for callers that need to force it at startup
    pub fn presence_mut(&mut self) -> &mut P {
        &mut self.presence
    }
}
