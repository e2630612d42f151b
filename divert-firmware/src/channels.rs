//! Inter-task communication
//!
//! Defines the statics shared between Embassy tasks and the edge handler.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use divert_core::latch::EdgeLatch;
use divert_core::telemetry::LogEvent;

/// Channel capacity for telemetry events
///
/// One object produces up to eight lines; this holds a few objects'
/// worth while the UART catches up.
const LOG_CHANNEL_SIZE: usize = 32;

/// Telemetry events from the sorter loop to the UART task
pub static LOG_CHANNEL: Channel<CriticalSectionRawMutex, LogEvent, LOG_CHANNEL_SIZE> =
    Channel::new();

/// Proximity interrupt edges pending for the sorter loop
pub static EDGE_LATCH: EdgeLatch = EdgeLatch::new();
