//! Proximity edge task
//!
//! Waits for the VL6180 GPIO1 line to fall and records the edge in the
//! shared latch. The sorter loop consumes it on its next poll; edges that
//! arrive before then collapse into one.

use defmt::*;
use embassy_rp::gpio::Input;

use crate::channels::EDGE_LATCH;

#[embassy_executor::task]
pub async fn edge_task(mut gpio1: Input<'static>) {
    info!("Edge task started");

    loop {
        gpio1.wait_for_falling_edge().await;
        EDGE_LATCH.signal();
        trace!("Proximity edge");
    }
}
