//! Hardware abstraction traits
//!
//! These traits define the interface between the sorting logic
//! and board-specific implementations.

pub mod belt;
pub mod clock;
pub mod output;
pub mod sensor;

pub use belt::BeltSpeedProvider;
pub use clock::{Clock, Millis};
pub use output::{ActuatorOutput, ChannelState, Indicator, CHANNEL_COUNT};
pub use sensor::{
    Color, ColorClassifier, ColorSensor, EdgeSource, RangeSensor, Rgbc, SensorError,
};
