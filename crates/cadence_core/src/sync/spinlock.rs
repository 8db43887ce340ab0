//! # Spinlock
//!
//! Busy-wait mutual exclusion for sections a few instructions long
//! (an arena append, a buffer swap). No OS blocking, no backoff.
//!
//! Plugged into `lock_api` so the guard, `try_lock` and poisoning-free
//! semantics match `parking_lot::Mutex`.
//!
//! Not reentrant: locking twice from one thread spins forever.

use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::lock_api::{self, GuardSend, RawMutex};

/// The raw lock word.
#[derive(Debug)]
pub struct RawSpinlock {
    locked: AtomicBool,
}

// SAFETY: `lock` only returns once this thread flipped `locked` from false to
// true with Acquire ordering, and `unlock` publishes with Release. At most one
// holder exists at a time.
#[allow(unsafe_code)]
unsafe impl RawMutex for RawSpinlock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = GuardSend;

    #[inline]
    fn lock(&self) {
        loop {
            if !self.locked.swap(true, Ordering::Acquire) {
                return;
            }
            // Spin on a plain load so waiters don't bounce the cache line.
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }

    #[inline]
    fn try_lock(&self) -> bool {
        !self.locked.load(Ordering::Relaxed) && !self.locked.swap(true, Ordering::Acquire)
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// A spinlock protecting a `T`.
pub type Spinlock<T> = lock_api::Mutex<RawSpinlock, T>;

/// RAII guard; the lock is released on drop.
pub type SpinlockGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinlock, T>;
