//! Serial Telemetry Protocol
//!
//! The sorter reports everything it does as one ASCII line per event on
//! its debug UART. Lines are `KEYWORD key=value ...` terminated by CRLF,
//! so they can be read in any serial terminal and grepped by tooling:
//!
//! ```text
//! DETECT t=1000 id=1
//! CLEAR t=1500 id=1
//! LENGTH t=1500 id=1 len_mm=0 dwell_ms=500
//! COLOR t=1500 id=1 n=19 r=100 g=500 b=50 c=800 class=G amb=0
//! CLASSIFY t=1500 id=1 color=G len_mm=0 class=Small thr=50
//! SCHEDULE t=1500 id=1 pos=Pos2 at=5363
//! ACTUATE t=5363 id=1 pos=Pos2
//! ```
//!
//! This is a small green object with the factory settings: 500 ms under
//! the sensor floors to 0 s of travel, and 240 mm to the second diverter
//! at 55 mm/s is 4363 ms, less the 500 ms advance.
//!
//! Timestamps are milliseconds since boot. The correlation `id` ties all
//! lines for one object together.

#![no_std]
#![deny(unsafe_code)]

pub mod line;

pub use line::{encode_line, encode_to_bytes, LineError, MAX_LINE_LEN};
