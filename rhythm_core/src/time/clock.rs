use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use atomic_float::AtomicF64;

/// Source of frame timestamps in milliseconds.
pub trait FrameClock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Wall-clock time since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
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

impl FrameClock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    now: Arc<AtomicF64>,
}

impl VirtualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Arc::new(AtomicF64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.store(ms, Ordering::Release);
    }

    /// Moves time forward and returns the new reading.
    pub fn advance(&self, ms: f64) -> f64 {
        self.now.fetch_add(ms, Ordering::AcqRel) + ms
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl FrameClock for VirtualClock {
    fn now_ms(&self) -> f64 {
        self.now.load(Ordering::Acquire)
    }
}

impl<C: FrameClock + ?Sized> FrameClock for Arc<C> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}
