//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in divert-core for the sorter's hardware:
//!
//! - Color sensor (APDS-9960, I2C)
//! - Proximity sensor (VL6180, I2C)
//! - Servo diverter bank (PWM)
//! - Belt stepper drive timing (TB6600)

#![no_std]
#![deny(unsafe_code)]

pub mod color;
pub mod error;
pub mod range;
pub mod servo;
pub mod stepper;

pub use error::Error;

#[cfg(test)]
pub(crate) mod mock;
