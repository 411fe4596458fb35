use std::fmt;

use crate::Core::alloc::Backing;
use crate::Core::cell::VersionCell;
use crate::MPMC::Buffer::{CircularBuffer, Reservation};

/// Debug function for Backing
///
/// Shows the kind of block, where it starts and how long it is.
/// Never dereferences the block.
pub fn debug_backing(backing: &Backing, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Backing")
        .field("kind", &backing.kind())
        .field("base", &format_args!("{:p}", backing.as_ptr()))
        .field("len", &backing.len())
        .finish()
}

/// Debug function for CircularBuffer
///
/// Shows:
/// - Capacity and current allocation cursor
/// - Underlying memory block
pub fn debug_circular_buffer<T: Copy, C: VersionCell>(
    ring: &CircularBuffer<T, C>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("CircularBuffer")
        .field("capacity", &ring.capacity())
        .field("size", &ring.size())
        .field("backing", &ring.backing)
        .finish()
}

impl fmt::Debug for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_backing(self, f)
    }
}

impl<T: Copy, C: VersionCell> fmt::Debug for CircularBuffer<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_circular_buffer(self, f)
    }
}

impl<T: Copy, C: VersionCell> fmt::Debug for Reservation<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reservation")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
