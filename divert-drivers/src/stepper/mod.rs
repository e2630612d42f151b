//! Belt stepper drive

pub mod tb6600;

pub use tb6600::{mm_per_pulse_x1000, step_rate_for, BeltDrive, StepTiming};
