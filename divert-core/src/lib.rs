//! Board-agnostic core logic for the conveyor sorter firmware
//!
//! This crate contains all sorting logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (clock, sensors, outputs, belt speed)
//! - Sense: detection sessions, length and color classification
//! - Decide: routing, travel-time scheduling and guardrails
//! - Actuate: diverter dwell timers and operational counters
//! - Interrupt-safe edge latch
//! - Event log types and the cooperative pipeline that ties it together
//! - Configuration types and the machine file parser

#![no_std]
#![deny(unsafe_code)]

pub mod actuate;
pub mod config;
pub mod decide;
pub mod latch;
pub mod pipeline;
pub mod sense;
pub mod telemetry;
pub mod traits;

pub use traits::Millis;
