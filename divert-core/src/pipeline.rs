//! Cooperative sorting loop
//!
//! [`Pipeline`] owns the three state machines and sequences them: sense,
//! then route and schedule any finished object, then release due
//! actuations and recenter expired ones. Call [`Pipeline::poll`] at
//! sub-millisecond cadence; nothing in it blocks.

use crate::actuate::{Actuate, CounterSnapshot};
use crate::config::TelemetryConfig;
use crate::decide::{route, CorrelationId, Decide, ScheduleReject, TargetPosition};
use crate::sense::{RatioClassifier, Sense, SenseResult};
use crate::telemetry::{EventSink, FaultCode, LogEvent};
use crate::traits::{
    ActuatorOutput, Clock, ColorClassifier, ColorSensor, EdgeSource, Indicator, Millis,
    RangeSensor,
};

/// What happened to a finished object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// Actuation accepted
    Scheduled {
        id: CorrelationId,
        position: TargetPosition,
        due_ms: Millis,
    },
    /// Left on the belt; `reason` is set when a schedule was refused
    Passed {
        id: CorrelationId,
        reason: Option<ScheduleReject>,
    },
    /// Needs manual handling
    Fault { id: CorrelationId, code: FaultCode },
}

/// Sense, Decide and Actuate wired together with an event sink
pub struct Pipeline<E, R, C, P, O, I, S, K = RatioClassifier> {
    sense: Sense<E, R, C, P, K>,
    decide: Decide,
    actuate: Actuate<O, I>,
    sink: S,
    next_id: CorrelationId,
    count_interval_ms: u32,
    last_count_ms: Millis,
}

impl<E, R, C, P, O, I, S, K> Pipeline<E, R, C, P, O, I, S, K>
where
    E: EdgeSource,
    R: RangeSensor,
    C: ColorSensor,
    P: Indicator,
    K: ColorClassifier,
    O: ActuatorOutput,
    I: Indicator,
    S: EventSink,
{
    pub fn new(
        sense: Sense<E, R, C, P, K>,
        decide: Decide,
        actuate: Actuate<O, I>,
        sink: S,
        telemetry: &TelemetryConfig,
    ) -> Self {
        Self {
            sense,
            decide,
            actuate,
            sink,
            next_id: 0,
            count_interval_ms: telemetry.count_interval_ms,
            last_count_ms: 0,
        }
    }

    /// Bring every component to its idle state and log the boot summary
    pub fn start(&mut self, now: Millis) {
        self.actuate.init(self.sense.presence_mut());
        self.sense.init(now);
        self.decide.init();
        self.actuate.counters_mut().reset();
        self.next_id = 0;

        self.sink.emit(LogEvent::Distances {
            mm: self.decide.distances_mm(),
        });
        self.sink.emit(LogEvent::Separator);
        self.emit_count(now);
    }

    /// Run one cooperative step
    ///
    /// Returns the disposition of an object whose session closed in this step.
    pub fn poll(&mut self, now: Millis) -> Option<Disposition> {
        let disposition = self
            .sense
            .poll(now, &self.decide)
            .map(|result| self.dispatch(result, now));

        if let Some(firing) = self.decide.tick(now, &mut self.actuate) {
            self.sink.emit(LogEvent::Actuate {
                t: now,
                id: firing.id,
                position: firing.position,
            });
        }
        self.actuate.tick(now);

        if self.count_interval_ms > 0
            && now.saturating_sub(self.last_count_ms) >= u64::from(self.count_interval_ms)
        {
            self.emit_count(now);
        }

        disposition
    }

    /// [`poll`](Self::poll) at the clock's current time
    pub fn service<T: Clock>(&mut self, clock: &T) -> Option<Disposition> {
        self.poll(clock.now_ms())
    }

    fn dispatch(&mut self, result: SenseResult, now: Millis) -> Disposition {
        self.next_id = self.next_id.wrapping_add(1);
        let id = self.next_id;
        let ev = result.event;

        self.sink.emit(LogEvent::Detect { t: ev.t_enter, id });
        self.sink.emit(LogEvent::Clear { t: ev.t_exit, id });
        self.sink.emit(LogEvent::Length {
            t: ev.t_exit,
            id,
            length_mm: result.length.length_mm,
            dwell_ms: result.length.dwell_ms,
        });
        self.sink.emit(LogEvent::ColorSample {
            t: ev.t_exit,
            id,
            samples: result.samples,
            rgbc: result.rgbc,
            color: result.color,
            ambiguous: result.ambiguous,
        });
        self.actuate.counters_mut().inc_total();

        if result.ambiguous {
            let code = FaultCode::Ambiguous;
            self.sink.emit(LogEvent::Fault { t: now, code });
            self.actuate.counters_mut().inc_fault();
            return Disposition::Fault { id, code };
        }

        let position = route(result.color, result.length.class);
        self.sink.emit(LogEvent::Classify {
            t: ev.t_exit,
            id,
            color: result.color,
            length_mm: result.length.length_mm,
            class: result.length.class,
            threshold_mm: self.sense.config().small_max_mm,
        });
        self.actuate.counters_mut().inc_color(result.color);

        if position == TargetPosition::PassThrough {
            self.pass(now);
            return Disposition::Passed { id, reason: None };
        }

        match self.decide.schedule(position, ev.t_exit, id) {
            Ok(due_ms) => {
                self.actuate.counters_mut().inc_diverted();
                self.sink.emit(LogEvent::Schedule {
                    t: ev.t_exit,
                    id,
                    position,
                    due_ms,
                });
                Disposition::Scheduled {
                    id,
                    position,
                    due_ms,
                }
            }
            Err(reason) => {
                self.sink.emit(LogEvent::ScheduleReject {
                    t: ev.t_exit,
                    id,
                    reason,
                });
                self.pass(now);
                Disposition::Passed {
                    id,
                    reason: Some(reason),
                }
            }
        }
    }

    fn pass(&mut self, now: Millis) {
        self.actuate.counters_mut().inc_passed();
        self.sink.emit(LogEvent::Pass { t: now });
    }

    fn emit_count(&mut self, now: Millis) {
        self.last_count_ms = now;
        self.sink.emit(LogEvent::Count {
            t: now,
            counters: self.actuate.counters().snapshot(),
        });
    }

    /// Forward an event from outside the loop (boot banners)
    pub fn emit(&mut self, event: LogEvent) {
        self.sink.emit(event);
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.actuate.counters().snapshot()
    }

    pub fn sense(&self) -> &Sense<E, R, C, P, K> {
        &self.sense
    }

    pub fn decide(&self) -> &Decide {
        &self.decide
    }

    /// Runtime tuning surface (spacing, throughput, belt speed)
    pub fn decide_mut(&mut self) -> &mut Decide {
        &mut self.decide
    }

    pub fn actuate(&self) -> &Actuate<O, I> {
        &self.actuate
    }

    /// Direct access to the outputs (startup mute release)
    pub fn actuate_mut(&mut self) -> &mut Actuate<O, I> {
        &mut self.actuate
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
