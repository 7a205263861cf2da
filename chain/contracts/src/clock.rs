//! Time source
//!
//! Timestamps are Unix seconds. They feed deadline checks and ciphertext
//! context binding only.

use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonically non-decreasing time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Never moves backwards: `set` to an earlier time is ignored.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn advance(&self, secs: i64) {
        if secs > 0 {
            self.now.fetch_add(secs, Ordering::SeqCst);
        }
    }

    pub fn set(&self, timestamp: i64) {
        self.now.fetch_max(timestamp, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
