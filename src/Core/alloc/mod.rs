use crate::Core::SharedMemory::SharedMemoryBackend;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::io;
use std::ptr::NonNull;

/// The memory block a ring lives on.
///
/// The ring owns exactly one of these; header and slots are carved out of it
/// and never handed out separately.
pub enum Backing {
    /// Zeroed heap block, freed on drop.
    Heap { ptr: NonNull<u8>, layout: Layout },
    /// A mapped shared memory segment, unmapped on drop.
    Shared(Box<dyn SharedMemoryBackend>),
    /// Caller-owned memory. Nothing is released on drop.
    Borrowed { ptr: NonNull<u8>, len: usize },
}

impl Backing {
    /// Allocate a zero-filled heap block of `size` bytes aligned to `align`.
    pub fn heap(size: usize, align: usize) -> io::Result<Self> {
        let layout = Layout::from_size_align(size.max(1), align).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid layout ({size} bytes, align {align}): {e}"),
            )
        })?;

        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("Failed to allocate {size} bytes for ring"),
            )
        })?;

        Ok(Backing::Heap { ptr, layout })
    }

    /// Start of the block.
    pub fn as_ptr(&self) -> *mut u8 {
        match self {
            Backing::Heap { ptr, .. } => ptr.as_ptr(),
            Backing::Shared(shm) => shm.as_ptr(),
            Backing::Borrowed { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Usable length of the block in bytes.
    pub fn len(&self) -> usize {
        match self {
            Backing::Heap { layout, .. } => layout.size(),
            Backing::Shared(shm) => shm.size(),
            Backing::Borrowed { len, .. } => *len,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Backing::Heap { .. } => "heap",
            Backing::Shared(_) => "shared",
            Backing::Borrowed { .. } => "borrowed",
        }
    }
}

impl Drop for Backing {
    fn drop(&mut self) {
        if let Backing::Heap { ptr, layout } = self {
            unsafe { dealloc(ptr.as_ptr(), *layout) };
        }
    }
}

// Implement Send + Sync: the block is plain memory, access is synchronized by the ring
unsafe impl Send for Backing {}
unsafe impl Sync for Backing {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_backing_is_zeroed_and_aligned() {
        let backing = Backing::heap(4096, 128).unwrap();
        assert_eq!(backing.len(), 4096);
        assert_eq!(backing.as_ptr() as usize % 128, 0);
        assert_eq!(backing.kind(), "heap");

        let bytes = unsafe { std::slice::from_raw_parts(backing.as_ptr(), backing.len()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn heap_backing_rejects_bad_alignment() {
        let err = Backing::heap(64, 3).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
