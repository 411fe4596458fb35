pub mod SharedMemory;
pub mod alloc;
pub mod cell;
pub mod futex;

pub use cell::{LocalCell, VersionCell};
pub use SharedMemory::{
    attach_shared_memory, create_shared_memory, unlink_shared_memory, RawHandle,
    SharedMemoryBackend,
};
