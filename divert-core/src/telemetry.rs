//! Advisory event log
//!
//! The pipeline reports what it does as [`LogEvent`] values. Sinks decide
//! how to render and transport them; dropping events never affects sorting.

use crate::actuate::CounterSnapshot;
use crate::decide::{CorrelationId, ScheduleReject, TargetPosition};
use crate::sense::LengthClass;
use crate::traits::{Color, Millis, Rgbc, CHANNEL_COUNT};

/// Conditions that need an operator's attention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCode {
    /// Too little light for a trustworthy color verdict
    Ambiguous,
}

impl FaultCode {
    pub const fn label(self) -> &'static str {
        match self {
            FaultCode::Ambiguous => "Ambiguous",
        }
    }
}

/// One event log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogEvent {
    /// Object entered the sensing point
    Detect { t: Millis, id: CorrelationId },
    /// Object left the sensing point
    Clear { t: Millis, id: CorrelationId },
    Length {
        t: Millis,
        id: CorrelationId,
        length_mm: u16,
        dwell_ms: Millis,
    },
    /// Averaged color reading behind a classification
    ColorSample {
        t: Millis,
        id: CorrelationId,
        samples: u16,
        rgbc: Rgbc,
        color: Color,
        ambiguous: bool,
    },
    Classify {
        t: Millis,
        id: CorrelationId,
        color: Color,
        length_mm: u16,
        class: LengthClass,
        threshold_mm: u16,
    },
    /// Actuation accepted, firing at `due_ms`
    Schedule {
        t: Millis,
        id: CorrelationId,
        position: TargetPosition,
        due_ms: Millis,
    },
    ScheduleReject {
        t: Millis,
        id: CorrelationId,
        reason: ScheduleReject,
    },
    /// Diverter fired
    Actuate {
        t: Millis,
        id: CorrelationId,
        position: TargetPosition,
    },
    /// Object left on the belt
    Pass { t: Millis },
    Fault { t: Millis, code: FaultCode },
    /// Periodic counter snapshot
    Count { t: Millis, counters: CounterSnapshot },
    /// Belt drive settings, logged once at boot
    Belt {
        step_rate_hz: u32,
        mm_per_pulse_x1000: u32,
        mm_per_s: u16,
    },
    /// Diverter distances, logged once at boot
    Distances { mm: [u16; CHANNEL_COUNT] },
    /// Divider between boot and runtime output
    Separator,
}

/// Destination for log events
///
/// Must not block: a sink that cannot accept an event drops it.
pub trait EventSink {
    fn emit(&mut self, event: LogEvent);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: LogEvent) {
        (**self).emit(event)
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: LogEvent) {}
}

/// Fixed-capacity in-memory sink; events past capacity are dropped
#[derive(Debug, Clone, Default)]
pub struct BufferSink<const N: usize> {
    events: heapless::Vec<LogEvent, N>,
    dropped: u32,
}

impl<const N: usize> BufferSink<N> {
    pub const fn new() -> Self {
        Self {
            events: heapless::Vec::new(),
            dropped: 0,
        }
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Events rejected because the buffer was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }
}

impl<const N: usize> EventSink for BufferSink<N> {
    fn emit(&mut self, event: LogEvent) {
        if self.events.push(event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}
