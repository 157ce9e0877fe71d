// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time sources for playback.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Instant;

/// Monotonic wall clock, in seconds from an arbitrary origin
pub trait Clock: Send + Sync {
    /// Current time in seconds
    fn now(&self) -> f64;
}

/// Clock backed by the tokio timer
///
/// Follows `tokio::time::pause`, so paused-runtime tests see the same time
/// as the frame driver.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock advanced by hand; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, seconds: f64) {
        *self.time.lock() += seconds;
    }

    /// Jump to an absolute time
    pub fn set(&self, seconds: f64) {
        *self.time.lock() = seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.time.lock()
    }
}
