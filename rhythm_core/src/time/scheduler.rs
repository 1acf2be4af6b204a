use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::time::clock::FrameClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct Running {
    token: CancelToken,
    handle: JoinHandle<()>,
}

/// Calls a frame callback at a fixed interval on a worker thread until the
/// callback returns [`LoopControl::Stop`] or the scheduler is stopped.
///
/// At most one loop runs at a time.
pub struct FrameScheduler {
    interval: Duration,
    running: Option<Running>,
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map_or(false, |r| !r.handle.is_finished())
    }

    /// Starts the loop. Returns `false`, and leaves the running loop alone,
    /// if one is already running.
    pub fn start<C, F>(&mut self, clock: C, mut frame: F) -> bool
    where
        C: FrameClock + 'static,
        F: FnMut(f64) -> LoopControl + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        self.reap();

        let token = CancelToken::new();
        let worker_token = token.clone();
        let interval = self.interval;
        let handle = thread::spawn(move || {
            while !worker_token.is_cancelled() {
                if frame(clock.now_ms()) == LoopControl::Stop {
                    debug!("frame loop stopped by callback");
                    break;
                }
                thread::sleep(interval);
            }
        });

        self.running = Some(Running { token, handle });
        true
    }

    /// Cancels the loop and waits for its thread. Safe to call repeatedly.
    /// No frame runs after this returns.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.token.cancel();
            let _ = running.handle.join();
        }
    }

    fn reap(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.handle.join();
        }
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
