//! A fixed-capacity, lock-free ring of versioned slots.
//!
//! Producers claim unique logical indices with a single atomic increment and
//! publish by bumping a per-slot version. Consumers validate reads against the
//! version a logical index expects, or block on that version until it shows up.
//! The header and slot array form one contiguous block, so a ring can be placed
//! in shared memory and attached by other processes.

// Module naming follows project convention (MPMC = Multi-Producer Multi-Consumer)
#![allow(non_snake_case)]

pub mod Core;
pub mod Debug;
pub mod MPMC;
pub mod error;
pub mod ffi;

pub use error::{Result, RingError};
pub use Core::cell::{LocalCell, VersionCell};
pub use MPMC::Buffer::{CircularBuffer, Reservation};
pub use MPMC::Structs::Notify;
pub use MPMC::{Reader, RingBuilder};
