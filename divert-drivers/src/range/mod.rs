//! Proximity (time-of-flight) sensors

pub mod vl6180;

pub use vl6180::{RangeReading, Vl6180};
