use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{fence, AtomicU64};
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;

use super::layout::{Header, LAYOUT_VERSION, MAGIC_NUMBER};
use super::Buffer::{CircularBuffer, Reservation, Slot};
use crate::error::{Result, RingError};
use crate::Core::alloc::Backing;
use crate::Core::cell::VersionCell;
use crate::MPMC::Structs::Buffer_Structs::Notify;

impl<T: Copy, C: VersionCell> CircularBuffer<T, C> {
    /// Create a heap-backed ring with `capacity` slots.
    ///
    /// All slot versions start at zero and the allocation cursor at zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let required = Self::checked_footprint(capacity)?;
        let backing = Backing::heap(required, Self::required_align())?;
        unsafe { Self::initialize(backing, capacity) }
    }

    /// Place a fresh ring on caller-supplied memory.
    ///
    /// The region must be at least [`memory_footprint(capacity)`] bytes and
    /// aligned to [`required_align()`]. Whatever it held before is discarded.
    ///
    /// # Safety
    /// `base..base + len` must be valid for reads and writes, must not be
    /// used for anything else, and must outlive the returned ring.
    ///
    /// [`memory_footprint(capacity)`]: Self::memory_footprint
    /// [`required_align()`]: Self::required_align
    pub unsafe fn init_in_place(base: *mut u8, len: usize, capacity: usize) -> Result<Self> {
        Self::checked_footprint(capacity)?;
        let ptr = NonNull::new(base)
            .ok_or_else(|| RingError::LayoutMismatch("null base pointer".to_string()))?;
        Self::initialize(Backing::Borrowed { ptr, len }, capacity)
    }

    /// View a ring that was already initialized in caller-supplied memory,
    /// typically by another process or through [`init_in_place`].
    ///
    /// # Safety
    /// Same contract as [`init_in_place`]; additionally the region must have
    /// been initialized for the same `T` and `C`.
    ///
    /// [`init_in_place`]: Self::init_in_place
    pub unsafe fn attach_in_place(base: *mut u8, len: usize) -> Result<Self> {
        let ptr = NonNull::new(base)
            .ok_or_else(|| RingError::LayoutMismatch("null base pointer".to_string()))?;
        Self::attach_backing(Backing::Borrowed { ptr, len })
    }

    /// Create a named shared memory segment sized for `capacity` slots and
    /// initialize a ring on it. An existing segment with that name is truncated.
    pub fn create_shared(name: &str, capacity: usize) -> Result<Self> {
        let required = Self::checked_footprint(capacity)?;
        let shm = crate::Core::SharedMemory::create_shared_memory(required, name)?;
        unsafe { Self::initialize(Backing::Shared(shm), capacity) }
    }

    /// Map a named shared memory segment holding an initialized ring.
    pub fn attach_shared(name: &str) -> Result<Self> {
        let shm = crate::Core::SharedMemory::attach_shared_memory(name)?;
        unsafe { Self::attach_backing(Backing::Shared(shm)) }
    }

    /// Size in bytes of one slot stride in memory.
    #[inline]
    pub fn slot_stride() -> usize {
        size_of::<Slot<T, C>>()
    }

    /// Byte offset of the first slot from the start of the block.
    #[inline]
    pub fn slots_offset() -> usize {
        let align = align_of::<Slot<T, C>>();
        (size_of::<Header>() + align - 1) & !(align - 1)
    }

    /// Alignment the start of the block must satisfy.
    #[inline]
    pub fn required_align() -> usize {
        align_of::<Header>().max(align_of::<Slot<T, C>>())
    }

    /// Exact number of bytes needed to hold a ring of `capacity` slots:
    /// the header, alignment padding, then `capacity` slot strides.
    ///
    /// Saturates at `usize::MAX` when the size is not representable.
    pub fn memory_footprint(capacity: usize) -> usize {
        Self::footprint(capacity).unwrap_or(usize::MAX)
    }

    fn footprint(capacity: usize) -> Option<usize> {
        capacity
            .checked_mul(Self::slot_stride())?
            .checked_add(Self::slots_offset())
    }

    fn checked_footprint(capacity: usize) -> Result<usize> {
        if capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }
        Self::footprint(capacity).ok_or(RingError::CapacityOverflow { capacity })
    }

    fn check_region(base: *mut u8, len: usize, required: usize) -> Result<()> {
        let align = Self::required_align();
        if (base as usize) % align != 0 {
            return Err(RingError::Misaligned { required: align });
        }
        if len < required {
            return Err(RingError::RegionTooSmall {
                required,
                actual: len,
            });
        }
        Ok(())
    }

    /// Write a fresh header and zero every slot version.
    ///
    /// # Safety
    /// No one else may write to the backing while this runs. Attachers may
    /// poll the magic concurrently.
    unsafe fn initialize(backing: Backing, capacity: usize) -> Result<Self> {
        let required = Self::checked_footprint(capacity)?;
        let base = backing.as_ptr();
        Self::check_region(base, backing.len(), required)?;

        let header = base as *mut Header;
        // Someone may already be polling for the magic; only touch it atomically
        (*header).magic.store(0, Relaxed);
        ptr::addr_of_mut!((*header).layout_version).write(LAYOUT_VERSION);
        ptr::addr_of_mut!((*header).reserved).write(0);
        ptr::addr_of_mut!((*header).capacity).write(capacity as u64);
        ptr::addr_of_mut!((*header).slot_size).write(Self::slot_stride() as u64);
        ptr::addr_of_mut!((*header).next_index).write(CachePadded::new(AtomicU64::new(0)));

        let slots = base.add(Self::slots_offset()) as *mut Slot<T, C>;
        for k in 0..capacity {
            ptr::addr_of_mut!((*slots.add(k)).version).write(C::new(0));
        }

        // Publish the magic last so an attacher never sees a half-built ring
        (*header).magic.store(MAGIC_NUMBER, Release);

        tracing::debug!(
            capacity,
            bytes = required,
            backing = backing.kind(),
            "initialized circular buffer"
        );

        Ok(Self {
            header: NonNull::new_unchecked(header),
            slots: NonNull::new_unchecked(slots),
            capacity,
            backing,
        })
    }

    /// Validate the header in `backing` and build a view over it.
    unsafe fn attach_backing(backing: Backing) -> Result<Self> {
        let base = backing.as_ptr();
        let len = backing.len();
        let align = Self::required_align();
        if (base as usize) % align != 0 {
            return Err(RingError::Misaligned { required: align });
        }
        if len < size_of::<Header>() {
            return Err(RingError::RegionTooSmall {
                required: size_of::<Header>(),
                actual: len,
            });
        }

        let header = base as *mut Header;
        let magic = (*header).magic.load(Acquire);

        if magic != MAGIC_NUMBER {
            tracing::warn!(magic, "attach rejected: bad magic");
            return Err(RingError::LayoutMismatch(format!(
                "invalid magic number {magic:#x} - memory not initialized as a ring"
            )));
        }
        if (*header).layout_version != LAYOUT_VERSION {
            tracing::warn!(found = (*header).layout_version, "attach rejected: layout version");
            return Err(RingError::LayoutMismatch(format!(
                "layout version {} (expected {LAYOUT_VERSION})",
                (*header).layout_version
            )));
        }
        if (*header).slot_size != Self::slot_stride() as u64 {
            tracing::warn!(
                found = (*header).slot_size,
                expected = Self::slot_stride(),
                "attach rejected: slot size"
            );
            return Err(RingError::LayoutMismatch(format!(
                "slot size {} (expected {}) - element type differs",
                (*header).slot_size,
                Self::slot_stride()
            )));
        }

        let raw_capacity = (*header).capacity;
        if raw_capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }
        let capacity = usize::try_from(raw_capacity).map_err(|_| RingError::CapacityOverflow {
            capacity: usize::MAX,
        })?;
        let required = Self::checked_footprint(capacity)?;
        if len < required {
            return Err(RingError::RegionTooSmall {
                required,
                actual: len,
            });
        }

        tracing::debug!(capacity, backing = backing.kind(), "attached circular buffer");

        Ok(Self {
            header: NonNull::new_unchecked(header),
            slots: NonNull::new_unchecked(base.add(Self::slots_offset()) as *mut Slot<T, C>),
            capacity,
            backing,
        })
    }

    #[inline]
    fn next_index(&self) -> &AtomicU64 {
        unsafe { &(*self.header.as_ptr()).next_index }
    }

    #[inline]
    fn slot(&self, index: u64) -> &Slot<T, C> {
        let i = (index % self.capacity as u64) as usize;
        unsafe { &*self.slots.as_ptr().add(i) }
    }

    /// Generation a slot must be at for `index` to be its current occupant.
    /// Computed modulo 2^32, like the version counter itself.
    #[inline]
    fn expected_version(&self, index: u64) -> u32 {
        (index / self.capacity as u64).wrapping_add(1) as u32
    }

    /// Claim the next logical index without publishing anything.
    ///
    /// This is the only step producers coordinate on: a single `fetch_add`.
    pub fn allocate(&self) -> Reservation<'_, T, C> {
        let index = self.next_index().fetch_add(1, Relaxed);
        // Pairs with the acquire fence in `read`: a reader that sees any of the
        // value bytes written after this point also sees the bumped cursor.
        fence(Release);
        Reservation { ring: self, index }
    }

    /// Publish a previously allocated index by bumping its slot version.
    ///
    /// With [`Notify::Wake`] every thread blocked in [`wait`](Self::wait) on
    /// that slot is woken.
    pub fn commit(&self, index: u64, notify: Notify) {
        let slot = self.slot(index);
        slot.version.fetch_add(1, Release);
        if notify.wakes() {
            slot.version.notify_all();
        }
    }

    /// Allocate, write and commit in one go. Returns the logical index.
    pub fn push(&self, value: T, notify: Notify) -> u64 {
        let mut reservation = self.allocate();
        reservation.write(value);
        reservation.commit(notify)
    }

    /// Copy out the value published at `index`.
    ///
    /// Fails with [`RingError::Pending`] when the index has not been allocated
    /// or its slot has not reached the index's generation yet, and with [`RingError::Overwritten`] when a
    /// later generation has taken (or is taking) the slot, including while
    /// the value was being copied.
    pub fn read(&self, index: u64) -> Result<T> {
        // Never handed out: the slot's version says nothing about this index
        if index >= self.size() {
            return Err(RingError::Pending { index });
        }
        let slot = self.slot(index);
        let expected = self.expected_version(index);

        let before = slot.version.load(Acquire);
        if before != expected {
            return Err(Self::mismatch(index, before, expected));
        }

        // May race with a wrapping producer, so it stays uninit until validated
        let value = unsafe { ptr::read_volatile(slot.value.get()) };

        fence(Acquire);
        let after = slot.version.load(Relaxed);
        if after != expected {
            return Err(Self::mismatch(index, after, expected));
        }

        // The producer of the next generation may be mid-write without having
        // committed yet.
        let next_generation = index.saturating_add(self.capacity as u64);
        if self.next_index().load(Relaxed) > next_generation {
            return Err(RingError::Overwritten { index });
        }

        Ok(unsafe { value.assume_init() })
    }

    fn mismatch(index: u64, observed: u32, expected: u32) -> RingError {
        if Self::reached(observed, expected) {
            RingError::Overwritten { index }
        } else {
            RingError::Pending { index }
        }
    }

    /// `observed >= expected` on the wrapping version counter. Only meaningful
    /// for indices that have been allocated.
    #[inline]
    fn reached(observed: u32, expected: u32) -> bool {
        (observed.wrapping_sub(expected) as i32) >= 0
    }

    /// The slot holding `index` has been committed at least up to the index's
    /// generation. A version far ahead of a never-allocated index wraps around
    /// and looks "reached", so the allocation cursor is checked too.
    #[inline]
    fn published(&self, index: u64, observed: u32, expected: u32) -> bool {
        index < self.size() && Self::reached(observed, expected)
    }

    /// Reference to the value in the slot `index` maps to, without any check.
    ///
    /// # Safety
    /// The slot must hold a published value and no producer may be writing it
    /// for as long as the reference lives.
    #[inline]
    pub unsafe fn get(&self, index: u64) -> &T {
        &*(self.slot(index).value.get() as *const T)
    }

    /// Mutable reference to the value in the slot `index` maps to, without any check.
    ///
    /// # Safety
    /// The slot must hold an initialized value (or the caller must only write
    /// through the reference), and no other process may access it meanwhile.
    #[inline]
    pub unsafe fn get_mut(&mut self, index: u64) -> &mut T {
        &mut *(self.slot(index).value.get() as *mut T)
    }

    /// Block until the slot `index` maps to has reached the index's generation.
    ///
    /// Returns immediately if it already has. Only commits made with
    /// [`Notify::Wake`] wake a sleeping waiter. Returning does not guarantee
    /// that a following [`read`](Self::read) succeeds: the slot may be
    /// overwritten again in between.
    pub fn wait(&self, index: u64) {
        let slot = self.slot(index);
        let expected = self.expected_version(index);
        loop {
            let current = slot.version.load(Acquire);
            if self.published(index, current, expected) {
                return;
            }
            slot.version.wait(current);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    ///
    /// Returns `true` if the generation was reached.
    pub fn wait_timeout(&self, index: u64, timeout: Duration) -> bool {
        let slot = self.slot(index);
        let expected = self.expected_version(index);
        let deadline = Instant::now() + timeout;
        loop {
            let current = slot.version.load(Acquire);
            if self.published(index, current, expected) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            slot.version.wait_timeout(current, remaining);
        }
    }

    /// Number of logical indices handed out so far, overwritten ones included.
    #[inline]
    pub fn size(&self) -> u64 {
        self.next_index().load(Acquire)
    }

    /// Fixed number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest logical index that may still be resident.
    pub fn oldest_index(&self) -> u64 {
        self.size().saturating_sub(self.capacity as u64)
    }

    /// Start of the memory block (the header).
    pub fn as_ptr(&self) -> *const u8 {
        self.backing.as_ptr()
    }
}

impl<'a, T: Copy, C: VersionCell> Reservation<'a, T, C> {
    /// The logical index this reservation claimed.
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Raw pointer to the slot value, for building a value in place.
    /// Every field must be written before committing.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ring.slot(self.index).value.get() as *mut T
    }

    /// Store `value` in the reserved slot.
    #[inline]
    pub fn write(&mut self, value: T) {
        unsafe { ptr::write_volatile(self.as_mut_ptr(), value) }
    }

    /// Publish the reservation. Returns its logical index.
    #[inline]
    pub fn commit(self, notify: Notify) -> u64 {
        self.ring.commit(self.index, notify);
        self.index
    }
}
