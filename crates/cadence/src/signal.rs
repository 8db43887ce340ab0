//! # Frame Signal
//!
//! The graphics thread bumps a frame counter right after it swaps the
//! command queue. Producers that want to pace themselves to the renderer
//! wait for the counter to move past the last value they saw.
//!
//! ```text
//! control:   push push push ── wait_next_frame(7) ─────────┐ push ...
//! graphics:  ... frame 7 ...  swap ─ advance() -> 8 ───────┘ drain apply
//! ```

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Monotonic frame counter with wake-ups.
#[derive(Debug, Default)]
pub struct FrameSignal {
    frame: Mutex<u64>,
    advanced: Condvar,
}

impl FrameSignal {
    /// Creates a signal at frame 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames completed so far.
    #[must_use]
    pub fn current(&self) -> u64 {
        *self.frame.lock()
    }

    /// Bumps the counter and wakes every waiter. Returns the new value.
    pub fn advance(&self) -> u64 {
        let next = {
            let mut frame = self.frame.lock();
            *frame += 1;
            *frame
        };
        self.advanced.notify_all();
        next
    }

    /// Blocks until the counter is greater than `last_seen`.
    ///
    /// Returns immediately if it already is. Returns the counter value
    /// observed on wake-up.
    pub fn wait_next_frame(&self, last_seen: u64) -> u64 {
        let mut frame = self.frame.lock();
        while *frame <= last_seen {
            self.advanced.wait(&mut frame);
        }
        *frame
    }

    /// Like [`FrameSignal::wait_next_frame`] but gives up after `timeout`.
    ///
    /// Returns `None` on timeout.
    pub fn wait_next_frame_timeout(&self, last_seen: u64, timeout: Duration) -> Option<u64> {
        let deadline = Instant::now() + timeout;
        let mut frame = self.frame.lock();
        while *frame <= last_seen {
            if self.advanced.wait_until(&mut frame, deadline).timed_out() {
                return (*frame > last_seen).then_some(*frame);
            }
        }
        Some(*frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_advance_counts_up() {
        let signal = FrameSignal::new();
        assert_eq!(signal.current(), 0);
        assert_eq!(signal.advance(), 1);
        assert_eq!(signal.advance(), 2);
        assert_eq!(signal.current(), 2);
    }

    #[test]
    fn test_wait_returns_immediately_when_behind() {
        let signal = FrameSignal::new();
        signal.advance();
        signal.advance();
        assert_eq!(signal.wait_next_frame(0), 2);
    }

    #[test]
    fn test_wait_timeout_expires() {
        let signal = FrameSignal::new();
        assert_eq!(
            signal.wait_next_frame_timeout(0, Duration::from_millis(10)),
            None
        );
    }

    #[test]
    fn test_waiter_woken_by_other_thread() {
        let signal = Arc::new(FrameSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_next_frame(0))
        };
        thread::sleep(Duration::from_millis(5));
        signal.advance();
        assert_eq!(waiter.join().unwrap(), 1);
    }
}
