//! Color sensors

pub mod apds9960;

pub use apds9960::{Apds9960, Apds9960Config, Gain};
