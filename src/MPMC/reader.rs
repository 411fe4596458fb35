// src/MPMC/reader.rs

use crate::error::RingError;
use crate::Core::cell::VersionCell;
use crate::MPMC::Buffer::CircularBuffer;
use std::time::{Duration, Instant};

/// A cursor that tails a ring in logical index order.
///
/// Every reader keeps its own position, so any number of them can follow the
/// same ring. A reader that falls more than `capacity` entries behind loses
/// the overwritten entries: it jumps to the oldest resident index and counts
/// what it skipped.
pub struct Reader<'a, T, C> {
    ring: &'a CircularBuffer<T, C>,
    cursor: u64,
    skipped: u64,
}

impl<'a, T: Copy, C: VersionCell> Reader<'a, T, C> {
    /// Start at logical index 0.
    pub fn from_start(ring: &'a CircularBuffer<T, C>) -> Self {
        Self::at(ring, 0)
    }

    /// Start after everything allocated so far; only new entries are seen.
    pub fn from_latest(ring: &'a CircularBuffer<T, C>) -> Self {
        Self::at(ring, ring.size())
    }

    pub fn at(ring: &'a CircularBuffer<T, C>, index: u64) -> Self {
        Self {
            ring,
            cursor: index,
            skipped: 0,
        }
    }

    /// Next logical index this reader will return.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Entries lost to overwrites so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn seek(&mut self, index: u64) {
        self.cursor = index;
    }

    /// Returns the next entry if it is published, `None` if the reader has
    /// caught up (or the next index is allocated but not committed yet).
    pub fn try_next(&mut self) -> Option<T> {
        loop {
            if self.cursor >= self.ring.size() {
                return None;
            }
            match self.ring.read(self.cursor) {
                Ok(value) => {
                    self.cursor += 1;
                    return Some(value);
                }
                Err(RingError::Overwritten { .. }) => self.skip_overwritten(),
                Err(_) => return None,
            }
        }
    }

    /// Blocks until the entry at the cursor is published and returns it.
    ///
    /// Relies on producers committing with `Notify::Wake`.
    pub fn next_blocking(&mut self) -> T {
        loop {
            self.ring.wait(self.cursor);
            if let Some(value) = self.try_next() {
                return value;
            }
        }
    }

    /// Like [`next_blocking`](Self::next_blocking) but gives up after `timeout`.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.try_next() {
                return Some(value);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.ring.wait_timeout(self.cursor, remaining) {
                return self.try_next();
            }
        }
    }

    fn skip_overwritten(&mut self) {
        let oldest = self.ring.oldest_index();
        // The slot at `oldest` may itself be getting overwritten; always make progress
        let target = oldest.max(self.cursor + 1);
        self.skipped += target - self.cursor;
        tracing::trace!(from = self.cursor, to = target, "reader skipped overwritten entries");
        self.cursor = target;
    }
}

impl<'a, T: Copy, C: VersionCell> Iterator for Reader<'a, T, C> {
    type Item = T;

    /// Non-blocking: ends as soon as the reader catches up.
    fn next(&mut self) -> Option<T> {
        self.try_next()
    }
}
