//! Sorter loop task
//!
//! Owns the pipeline and steps it at a fixed sub-millisecond cadence.
//! Servo outputs stay muted for the configured startup period.

use defmt::*;
use embassy_time::{Duration, Ticker};

use divert_core::pipeline::Disposition;
use divert_core::traits::Clock;

use crate::board::{EmbassyClock, SorterPipeline};

/// Poll interval in microseconds
pub const POLL_INTERVAL_US: u64 = 500;

#[embassy_executor::task]
pub async fn sorter_task(mut pipeline: SorterPipeline, startup_mute_ms: u32) {
    info!("Sorter task started");

    let clock = EmbassyClock;
    let started = clock.now_ms();
    pipeline.start(started);
    let unmute_at = started.saturating_add(u64::from(startup_mute_ms));

    let mut ticker = Ticker::every(Duration::from_micros(POLL_INTERVAL_US));
    let mut reported_drops = 0;

    loop {
        if pipeline.actuate().output().is_muted() && clock.now_ms() >= unmute_at {
            pipeline.actuate_mut().output_mut().unmute();
            info!("Servo outputs enabled");
        }

        match pipeline.service(&clock) {
            Some(Disposition::Scheduled { id, position, due_ms }) => {
                debug!("Object {} -> {} at {}", id, position.label(), due_ms);
            }
            Some(Disposition::Passed { id, reason }) => {
                debug!("Object {} passed ({:?})", id, reason);
            }
            Some(Disposition::Fault { id, code }) => {
                warn!("Object {} fault: {}", id, code.label());
            }
            None => {}
        }

        let dropped = pipeline.sink().dropped();
        if dropped != reported_drops {
            warn!("Telemetry channel full, {} events dropped", dropped);
            reported_drops = dropped;
        }

        ticker.next().await;
    }
}
