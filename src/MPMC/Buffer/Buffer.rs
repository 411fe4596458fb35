// The versioned ring: one header followed by `capacity` slots in a single block

use super::layout::Header;
use crate::Core::alloc::Backing;
use crate::Core::cell::VersionCell;

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr::NonNull;
use std::sync::atomic::AtomicU32;

/// A single slot of the ring.
///
/// `#[repr(C)]` so the layout is identical for every process mapping the block:
/// the version counter first, then the value.
#[repr(C)]
pub struct Slot<T, C = AtomicU32> {
    /// How many times this slot has been published.
    /// Logical index `i` owns the slot while `version == i / capacity + 1`.
    pub version: C,

    /// The payload. Uninitialized until the first publish to this slot.
    pub value: UnsafeCell<MaybeUninit<T>>,
}

/// A fixed-capacity, lock-free, multi-producer multi-consumer ring of versioned slots.
///
/// ### Concurrency Design:
/// - **Producers**: claim a unique logical index with one `fetch_add` on the
///   header's `next_index`, write the slot at `index % capacity`, then bump the
///   slot's version. There is no back-pressure: a producer that laps the ring
///   overwrites whatever is there.
/// - **Consumers**: read a logical index by checking the slot version before
///   and after copying the value (seqlock style). A mismatch means the index
///   is not published yet or has been overwritten.
/// - **Waiters**: block on the slot version until it reaches the generation
///   of the index they care about.
///
/// The header and slots live in one contiguous [`Backing`] block, so the
/// whole structure can sit in a shared memory segment and be attached by
/// other processes.
pub struct CircularBuffer<T, C = AtomicU32> {
    /// Pointer to the header at the start of the block.
    pub(crate) header: NonNull<Header>,

    /// Pointer to the first slot.
    pub(crate) slots: NonNull<Slot<T, C>>,

    /// The capacity of the buffer (number of slots). Cached from the header.
    pub(crate) capacity: usize,

    /// Owner of the memory block.
    pub(crate) backing: Backing,
}

unsafe impl<T: Copy + Send, C: VersionCell + Send> Send for CircularBuffer<T, C> {}
unsafe impl<T: Copy + Send, C: VersionCell + Sync> Sync for CircularBuffer<T, C> {}

/// A claimed but not yet published logical index.
///
/// Returned by [`CircularBuffer::allocate`]. Write the value (or build it in
/// place through [`Reservation::as_mut_ptr`]) and then publish it with
/// [`Reservation::commit`] or [`CircularBuffer::commit`]. Dropping a
/// reservation without committing leaves the index unpublished for good;
/// readers see it as pending until the slot is reused.
#[must_use = "an allocated index stays unpublished until it is committed"]
pub struct Reservation<'a, T, C = AtomicU32> {
    pub(crate) ring: &'a CircularBuffer<T, C>,
    pub(crate) index: u64,
}
