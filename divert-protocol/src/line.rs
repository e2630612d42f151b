//! Event line rendering

use core::fmt::{self, Write};

use divert_core::telemetry::LogEvent;
use heapless::String;

/// Upper bound on one rendered line, terminator included
pub const MAX_LINE_LEN: usize = 192;

const TERMINATOR: &str = "\r\n";

/// Errors that can occur while rendering a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Destination cannot hold the whole line
    BufferTooSmall,
}

impl From<fmt::Error> for LineError {
    fn from(_: fmt::Error) -> Self {
        LineError::BufferTooSmall
    }
}

/// Render `event` into `out`, replacing its contents.
///
/// On error `out` holds a truncated line and must not be sent.
pub fn encode_line<const N: usize>(
    event: &LogEvent,
    out: &mut String<N>,
) -> Result<(), LineError> {
    out.clear();
    render(event, out)?;
    Ok(())
}

/// Render `event` into a byte buffer
///
/// Returns the number of bytes written
pub fn encode_to_bytes(event: &LogEvent, buffer: &mut [u8]) -> Result<usize, LineError> {
    let mut cursor = Cursor { buf: buffer, pos: 0 };
    render(event, &mut cursor)?;
    Ok(cursor.pos)
}

/// `fmt::Write` over a fixed byte slice
struct Cursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Write for Cursor<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let end = self.pos.checked_add(bytes.len()).ok_or(fmt::Error)?;
        let dst = self.buf.get_mut(self.pos..end).ok_or(fmt::Error)?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

fn render<W: Write>(event: &LogEvent, w: &mut W) -> fmt::Result {
    match *event {
        LogEvent::Detect { t, id } => write!(w, "DETECT t={} id={}", t, id)?,
        LogEvent::Clear { t, id } => write!(w, "CLEAR t={} id={}", t, id)?,
        LogEvent::Length {
            t,
            id,
            length_mm,
            dwell_ms,
        } => write!(
            w,
            "LENGTH t={} id={} len_mm={} dwell_ms={}",
            t, id, length_mm, dwell_ms
        )?,
        LogEvent::ColorSample {
            t,
            id,
            samples,
            rgbc,
            color,
            ambiguous,
        } => write!(
            w,
            "COLOR t={} id={} n={} r={} g={} b={} c={} class={} amb={}",
            t,
            id,
            samples,
            rgbc.r,
            rgbc.g,
            rgbc.b,
            rgbc.c,
            color.label(),
            u8::from(ambiguous)
        )?,
        LogEvent::Classify {
            t,
            id,
            color,
            length_mm,
            class,
            threshold_mm,
        } => write!(
            w,
            "CLASSIFY t={} id={} color={} len_mm={} class={} thr={}",
            t,
            id,
            color.label(),
            length_mm,
            class.label(),
            threshold_mm
        )?,
        LogEvent::Schedule {
            t,
            id,
            position,
            due_ms,
        } => write!(
            w,
            "SCHEDULE t={} id={} pos={} at={}",
            t,
            id,
            position.label(),
            due_ms
        )?,
        LogEvent::ScheduleReject { t, id, reason } => write!(
            w,
            "SCHEDULE_REJECT t={} id={} reason={}",
            t,
            id,
            reason.reason()
        )?,
        LogEvent::Actuate { t, id, position } => {
            write!(w, "ACTUATE t={} id={} pos={}", t, id, position.label())?
        }
        LogEvent::Pass { t } => write!(w, "PASS t={}", t)?,
        LogEvent::Fault { t, code } => write!(w, "FAULT t={} code={}", t, code.label())?,
        LogEvent::Count { t, counters: c } => write!(
            w,
            "COUNT t={} total={} diverted={} passed={} fault={} red={} green={} blue={} other={}",
            t, c.total, c.diverted, c.passed, c.fault, c.red, c.green, c.blue, c.other
        )?,
        LogEvent::Belt {
            step_rate_hz,
            mm_per_pulse_x1000,
            mm_per_s,
        } => write!(
            w,
            "BELT: step_rate={} Hz, mm_per_pulse={}.{:03} mm, belt={} mm/s",
            step_rate_hz,
            mm_per_pulse_x1000 / 1000,
            mm_per_pulse_x1000 % 1000,
            mm_per_s
        )?,
        LogEvent::Distances { mm } => {
            write!(w, "DIST: D1={}mm D2={}mm D3={}mm", mm[0], mm[1], mm[2])?
        }
        LogEvent::Separator => w.write_str("*******")?,
    }
    w.write_str(TERMINATOR)
}
