//! Version counters backing each slot.
//!
//! The ring never touches a slot version directly; it goes through
//! [`VersionCell`]. The default is [`AtomicU32`], which blocks on a futex.
//! [`LocalCell`] is a plain `Cell<u32>` for deterministic single-threaded tests.

use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use super::futex::{futex_wait, futex_wake_all};

/// An integer cell supporting load, store, fetch-add, blocking wait and wake.
///
/// Implementations are placed directly in the ring's memory block and are
/// never dropped, so they must not own resources.
pub trait VersionCell {
    fn new(value: u32) -> Self;

    fn load(&self, order: Ordering) -> u32;

    fn store(&self, value: u32, order: Ordering);

    /// Adds `delta` (wrapping) and returns the previous value.
    fn fetch_add(&self, delta: u32, order: Ordering) -> u32;

    /// Blocks while the cell holds `current`. May return spuriously.
    fn wait(&self, current: u32);

    /// Like [`VersionCell::wait`] but gives up after `timeout`.
    fn wait_timeout(&self, current: u32, timeout: Duration);

    /// Wakes every thread blocked on this cell.
    fn notify_all(&self);
}

impl VersionCell for AtomicU32 {
    #[inline]
    fn new(value: u32) -> Self {
        AtomicU32::new(value)
    }

    #[inline]
    fn load(&self, order: Ordering) -> u32 {
        AtomicU32::load(self, order)
    }

    #[inline]
    fn store(&self, value: u32, order: Ordering) {
        AtomicU32::store(self, value, order)
    }

    #[inline]
    fn fetch_add(&self, delta: u32, order: Ordering) -> u32 {
        AtomicU32::fetch_add(self, delta, order)
    }

    #[inline]
    fn wait(&self, current: u32) {
        futex_wait(self, current, None);
    }

    #[inline]
    fn wait_timeout(&self, current: u32, timeout: Duration) {
        futex_wait(self, current, Some(timeout));
    }

    #[inline]
    fn notify_all(&self) {
        futex_wake_all(self);
    }
}

/// Non-atomic counter for single-threaded tests.
///
/// Not `Sync`, so a ring built on it cannot be shared between threads.
/// Nobody else can bump the counter while the owning thread is blocked, so
/// waiting on an unmet condition panics instead of hanging forever.
#[derive(Debug, Default)]
pub struct LocalCell(Cell<u32>);

impl VersionCell for LocalCell {
    fn new(value: u32) -> Self {
        LocalCell(Cell::new(value))
    }

    fn load(&self, _order: Ordering) -> u32 {
        self.0.get()
    }

    fn store(&self, value: u32, _order: Ordering) {
        self.0.set(value)
    }

    fn fetch_add(&self, delta: u32, _order: Ordering) -> u32 {
        let prev = self.0.get();
        self.0.set(prev.wrapping_add(delta));
        prev
    }

    fn wait(&self, current: u32) {
        if self.0.get() == current {
            panic!("LocalCell::wait would block forever on version {current}");
        }
    }

    fn wait_timeout(&self, current: u32, timeout: Duration) {
        if self.0.get() == current {
            // Nothing can change the value meanwhile; just burn the timeout.
            let deadline = Instant::now() + timeout;
            while Instant::now() < deadline {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
            }
        }
    }

    fn notify_all(&self) {}
}
