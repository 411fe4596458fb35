mod builder;
mod reader;

pub use builder::{RingBuilder, DEFAULT_CAPACITY};
pub use reader::Reader;

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use Buffer::{CircularBuffer, Reservation, Slot}; // re-export for stable path
}

pub mod Structs {
    pub mod Buffer_Structs;
    pub use Buffer_Structs::Notify; // re-export for stable path
}
