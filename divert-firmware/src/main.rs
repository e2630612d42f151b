//! Divert - Conveyor Sorting Machine Firmware
//!
//! Main firmware binary for the RP2040-based belt sorter. A proximity
//! sensor opens a detection session, a color sensor samples the object
//! while it passes, and three servo diverters fire once the belt has
//! carried the object to its chute.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm, PwmOutput};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use fixed::traits::ToFixed;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use divert_core::actuate::Actuate;
use divert_core::config::{parse_config, SorterConfig};
use divert_core::decide::Decide;
use divert_core::pipeline::Pipeline;
use divert_core::sense::Sense;
use divert_core::telemetry::LogEvent;
use divert_drivers::color::{Apds9960, Apds9960Config};
use divert_drivers::range::Vl6180;
use divert_drivers::servo::{ServoBank, FRAME_US};
use divert_drivers::stepper::BeltDrive;
use divert_drivers::Error as DriverError;

use crate::board::{ChannelSink, Led, PWM_COUNTER_HZ, PWM_DIVIDER};
use crate::channels::EDGE_LATCH;

/// Embedded machine configuration (compiled into firmware)
/// Edit machine.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../machine.toml");

/// I2C bus speed for both sensors
const I2C_FREQUENCY: u32 = 400_000;

mod board;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 16]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Divert firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Log UART (115200 8N1); RX is unused
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 16]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, _rx) = uart.split();
    info!("Log UART initialized");

    // Indicators: illumination on only once Actuate initializes
    let illumination = Led::new(Output::new(p.PIN_12, Level::Low));
    let presence = Led::new(Output::new(p.PIN_25, Level::Low));

    // Servo diverters, 1 us per count on a 20 ms frame
    let mut servo_pwm = PwmConfig::default();
    servo_pwm.divider = PWM_DIVIDER.to_fixed();
    servo_pwm.top = FRAME_US - 1;
    servo_pwm.compare_a = 0;
    let servos = [
        servo_output(Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, servo_pwm.clone())),
        servo_output(Pwm::new_output_a(p.PWM_SLICE1, p.PIN_18, servo_pwm.clone())),
        servo_output(Pwm::new_output_a(p.PWM_SLICE2, p.PIN_20, servo_pwm)),
    ];
    let servos = ServoBank::new(servos, &config.actuate);
    info!("Servos initialized (muted)");

    // Belt: fixed-rate STEP pulses; Decide uses the speed actually achieved
    let mut belt = BeltDrive::new(&config.belt);
    belt.start();
    let mut step_pwm = PwmConfig::default();
    step_pwm.divider = PWM_DIVIDER.to_fixed();
    match belt.timing(PWM_COUNTER_HZ) {
        Some(timing) => {
            step_pwm.top = timing.top;
            step_pwm.compare_a = timing.compare;
        }
        None => {
            warn!("Belt speed is zero, STEP output idle");
            step_pwm.enable = false;
        }
    }
    let _step = Pwm::new_output_a(p.PWM_SLICE3, p.PIN_22, step_pwm);
    info!(
        "Belt: {} Hz, {} mm/s achieved",
        belt.step_rate_hz(),
        belt.achieved_mm_per_s()
    );

    // Proximity sensor on I2C0
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = I2C_FREQUENCY;
    let range_bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config.clone());
    let mut range = Vl6180::new(range_bus);
    match range.init(&mut Delay, config.range.measurement_period_ms) {
        Ok(()) => {
            if let Err(e) = range.configure_threshold(config.range.threshold_mm) {
                error!("VL6180 threshold setup failed: {:?}", e);
            } else {
                info!("VL6180 ranging, threshold {} mm", config.range.threshold_mm);
            }
        }
        Err(e) => error!("VL6180 init failed: {:?}", e),
    }

    // Color sensor on I2C1
    let color_bus = I2c::new_blocking(p.I2C1, p.PIN_7, p.PIN_6, i2c_config);
    let mut color = Apds9960::new(color_bus, Apds9960Config::default());
    match color.check_id() {
        Ok(id) => info!("APDS-9960 id={=u8:#x}", id),
        // Clones report other IDs but share the color register map
        Err(DriverError::InvalidData) => warn!("APDS-9960 unexpected id, continuing"),
        Err(e) => warn!("APDS-9960 id read failed: {:?}", e),
    }
    if let Err(e) = color.init() {
        error!("APDS-9960 init failed: {:?}", e);
    }

    let gpio1 = Input::new(p.PIN_15, Pull::Up);

    // Assemble the sorter
    let sense = Sense::new(&EDGE_LATCH, range, color, presence, config.sense);
    let decide = Decide::new(&config.decide, belt.achieved_mm_per_s());
    let actuate = Actuate::new(servos, illumination, &config.actuate);
    let mut pipeline = Pipeline::new(
        sense,
        decide,
        actuate,
        ChannelSink::default(),
        &config.telemetry,
    );
    pipeline.emit(LogEvent::Belt {
        step_rate_hz: belt.step_rate_hz(),
        mm_per_pulse_x1000: belt.mm_per_pulse_x1000(),
        mm_per_s: belt.achieved_mm_per_s(),
    });

    // Spawn tasks
    spawner.spawn(tasks::log_tx_task(tx)).unwrap();
    spawner.spawn(tasks::edge_task(gpio1)).unwrap();
    spawner
        .spawn(tasks::sorter_task(pipeline, config.actuate.startup_mute_ms))
        .unwrap();

    info!("All tasks spawned, firmware running");

    // The STEP slice must stay alive; all other work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Channel A output of a servo slice
fn servo_output(pwm: Pwm<'static>) -> PwmOutput<'static> {
    let (a, _b) = pwm.split();
    unwrap!(a)
}

/// Parse the embedded machine.toml
///
/// Falls back to factory defaults if it does not parse; build.rs
/// validates the file, so this only happens during development.
fn load_config() -> SorterConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using factory defaults");
            SorterConfig::default()
        }
    }
}
