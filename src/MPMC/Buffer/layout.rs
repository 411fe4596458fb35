use crossbeam_utils::CachePadded;
use std::sync::atomic::AtomicU64;

/// "DMXP_RNG": marks a memory block holding an initialized ring.
pub const MAGIC_NUMBER: u64 = 0x444D58505F524E47;

/// Bumped whenever the header or slot layout changes.
pub const LAYOUT_VERSION: u32 = 1;

/// The fixed-size header at the very beginning of a ring's memory block.
///
/// The slot array follows immediately, padded only up to the slot alignment.
/// Any process that maps the block finds everything it needs here to
/// recompute slot offsets: the capacity and the per-slot stride.
#[repr(C)]
pub struct Header {
    /// A "magic number" identifying the block as a ring. Stored last (release)
    /// during initialization and loaded first (acquire) on attach.
    pub magic: AtomicU64,

    /// The version of the memory layout.
    pub layout_version: u32,

    /// Reserved/padding.
    pub reserved: u32,

    /// Number of slots. Immutable after initialization.
    pub capacity: u64,

    /// Size in bytes of one slot, checked on attach so that two processes
    /// agree on the element type's layout.
    pub slot_size: u64,

    /// The allocation cursor. Producers `fetch_add` it to claim a logical index.
    /// Padded so producers hammering it do not share a line with the fields above.
    pub next_index: CachePadded<AtomicU64>,
}
