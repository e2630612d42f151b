//! Board glue: pin assignments and adapters from Embassy types to
//! the core traits.
//!
//! Pin map (RP2040):
//!
//! | Function            | GPIO | Peripheral      |
//! |---------------------|------|-----------------|
//! | Log TX              | 0    | UART0           |
//! | VL6180 SDA / SCL    | 4/5  | I2C0            |
//! | APDS-9960 SDA / SCL | 6/7  | I2C1            |
//! | Illumination LEDs   | 12   |                 |
//! | VL6180 GPIO1        | 15   | falling edge    |
//! | Servo 1 / 2 / 3     | 16/18/20 | PWM0A/1A/2A |
//! | Belt STEP           | 22   | PWM3A           |
//! | Presence LED        | 25   |                 |

use embassy_rp::gpio::Output;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::{I2C0, I2C1};
use embassy_rp::pwm::PwmOutput;
use embassy_time::Instant;

use divert_core::latch::EdgeLatch;
use divert_core::pipeline::Pipeline;
use divert_core::telemetry::{EventSink, LogEvent};
use divert_core::traits::{Clock, Indicator, Millis};
use divert_drivers::color::Apds9960;
use divert_drivers::range::Vl6180;
use divert_drivers::servo::ServoBank;

use crate::channels::LOG_CHANNEL;

/// PWM counter rate after the clock divider (125 MHz / 125)
pub const PWM_COUNTER_HZ: u32 = 1_000_000;

/// Integer clock divider giving [`PWM_COUNTER_HZ`]
pub const PWM_DIVIDER: u8 = 125;

pub type RangeBus = I2c<'static, I2C0, Blocking>;
pub type ColorBus = I2c<'static, I2C1, Blocking>;

/// The sorter loop with this board's devices plugged in
pub type SorterPipeline = Pipeline<
    &'static EdgeLatch,
    Vl6180<RangeBus>,
    Apds9960<ColorBus>,
    Led,
    ServoBank<PwmOutput<'static>>,
    Led,
    ChannelSink,
>;

/// Milliseconds since boot from the Embassy time driver
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> Millis {
        Instant::now().as_millis()
    }
}

/// Active-high LED output
pub struct Led(Output<'static>);

impl Led {
    pub fn new(pin: Output<'static>) -> Self {
        Self(pin)
    }
}

impl Indicator for Led {
    fn set(&mut self, on: bool) {
        if on {
            self.0.set_high();
        } else {
            self.0.set_low();
        }
    }
}

/// Forwards events to the UART task without waiting
#[derive(Default)]
pub struct ChannelSink {
    dropped: u32,
}

impl ChannelSink {
    /// Events lost to a full channel
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: LogEvent) {
        if LOG_CHANNEL.try_send(event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}
