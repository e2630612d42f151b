//! Interrupt-to-loop edge handoff
//!
//! A single pending flag: the interrupt side sets it, the cooperative loop
//! reads and clears it in one atomic swap. Multiple edges between two drains
//! collapse into one notification.

use portable_atomic::{AtomicBool, Ordering};

use crate::traits::EdgeSource;

/// Single-slot edge latch, safe to share between interrupt and thread context
#[derive(Debug)]
pub struct EdgeLatch {
    pending: AtomicBool,
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeLatch {
    /// Create an empty latch (usable in `static` items)
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Record that an edge occurred
    pub fn signal(&self) {
        self.pending.store(true, Ordering::Release);
    }
}

impl EdgeSource for EdgeLatch {
    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}
