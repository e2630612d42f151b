//! Telemetry UART transmit task
//!
//! Renders events from the sorter loop as text lines and writes them to
//! the log UART. Each event is also mirrored to defmt.

use defmt::*;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;
use heapless::String;

use divert_protocol::{encode_line, MAX_LINE_LEN};

use crate::channels::LOG_CHANNEL;

#[embassy_executor::task]
pub async fn log_tx_task(mut tx: BufferedUartTx<'static, UART0>) {
    info!("Log TX task started");

    let mut line: String<MAX_LINE_LEN> = String::new();

    loop {
        let event = LOG_CHANNEL.receive().await;
        debug!("{:?}", event);

        if let Err(e) = encode_line(&event, &mut line) {
            warn!("Failed to render event: {:?}", e);
            continue;
        }

        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("Failed to send log line: {:?}", e);
        }
    }
}
