//! Proximity and color sensor traits

/// Errors that can occur when reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction failed (NACK, arbitration loss, timeout)
    Bus,
}

/// Raw red, green, blue and clear channel counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgbc {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    /// Unfiltered (clear) channel, proportional to total light
    pub c: u16,
}

impl Rgbc {
    pub const fn new(r: u16, g: u16, b: u16, c: u16) -> Self {
        Self { r, g, b, c }
    }
}

/// Dominant color of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Red,
    Green,
    Blue,
    /// No channel dominates
    Other,
}

impl Color {
    /// Short label used in log lines
    pub const fn label(self) -> &'static str {
        match self {
            Color::Red => "R",
            Color::Green => "G",
            Color::Blue => "B",
            Color::Other => "Other",
        }
    }
}

/// Source of proximity edge notifications
///
/// The edge is raised from interrupt context and drained from the
/// cooperative loop. `take` is a destructive read: it returns `true` at most
/// once per pending notification.
pub trait EdgeSource {
    /// Read and clear the pending edge flag
    fn take(&self) -> bool;
}

impl<T: EdgeSource + ?Sized> EdgeSource for &T {
    fn take(&self) -> bool {
        (**self).take()
    }
}

/// Proximity (time-of-flight) sensor
pub trait RangeSensor {
    /// Acknowledge a pending ranging interrupt so the sensor can raise the next one
    ///
    /// Errors are swallowed; a missed acknowledge only delays the next edge.
    fn acknowledge(&mut self);
}

/// RGBC color sensor
pub trait ColorSensor {
    /// Read one sample of all four channels
    fn read_rgbc(&mut self) -> Result<Rgbc, SensorError>;
}

/// Maps raw channel counts to a color verdict
pub trait ColorClassifier {
    fn classify(&self, rgbc: Rgbc) -> Color;
}
