use crate::error::{Result, RingError};
use crate::Core::cell::VersionCell;
use crate::MPMC::Buffer::CircularBuffer;

/// Default number of slots for a ring built without an explicit capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Configures where a ring lives and how big it is.
///
/// Without a shared name the ring is heap-backed and private to this process.
/// With one, [`build`](Self::build) creates `/dev/shm/<name>` and
/// [`attach`](Self::attach) maps an existing segment.
#[derive(Debug, Clone)]
pub struct RingBuilder {
    capacity: usize,
    shared_name: Option<String>,
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            shared_name: None,
        }
    }
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_shared_name(mut self, name: impl Into<String>) -> Self {
        self.shared_name = Some(name.into());
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn shared_name(&self) -> Option<&str> {
        self.shared_name.as_deref()
    }

    /// Bytes the configured ring occupies for element type `T`.
    pub fn memory_footprint<T: Copy, C: VersionCell>(&self) -> usize {
        CircularBuffer::<T, C>::memory_footprint(self.capacity)
    }

    /// Create a new ring, in shared memory when a name is configured.
    pub fn build<T: Copy, C: VersionCell>(self) -> Result<CircularBuffer<T, C>> {
        match self.shared_name {
            Some(name) => CircularBuffer::create_shared(&name, self.capacity),
            None => CircularBuffer::new(self.capacity),
        }
    }

    /// Attach to the ring in the configured shared memory segment.
    /// The capacity comes from the segment's header.
    pub fn attach<T: Copy, C: VersionCell>(self) -> Result<CircularBuffer<T, C>> {
        let name = self.shared_name.ok_or(RingError::MissingName)?;
        CircularBuffer::attach_shared(&name)
    }
}
