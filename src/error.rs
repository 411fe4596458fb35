//! Errors raised by the circular buffer.

use std::io;
use thiserror::Error;

/// Everything that can go wrong while building, placing or reading a ring.
#[derive(Error, Debug)]
pub enum RingError {
    /// A ring needs at least one slot; every index is reduced modulo the capacity.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    /// The byte size of the requested ring does not fit in `usize`.
    #[error("capacity {capacity} overflows the addressable memory size")]
    CapacityOverflow {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The slot for this index still holds an older generation.
    /// Retrying the same index can succeed once the producer commits.
    #[error("index {index} has not been published yet")]
    Pending {
        /// Logical index that was read.
        index: u64,
    },

    /// A wrapping producer has reused the slot. The value is gone for good.
    #[error("index {index} has been overwritten")]
    Overwritten {
        /// Logical index that was read.
        index: u64,
    },

    /// The memory region handed to the ring cannot hold it.
    #[error("memory region too small: need {required} bytes, got {actual}")]
    RegionTooSmall { required: usize, actual: usize },

    /// The memory region does not start on the alignment the layout needs.
    #[error("memory region misaligned: need {required}-byte alignment")]
    Misaligned { required: usize },

    /// The region holds something other than a ring of this element type.
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    /// Attaching to shared memory requires a segment name.
    #[error("no shared memory name configured")]
    MissingName,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RingError {
    /// True for both read failures: not yet published, or overwritten.
    pub fn is_invalid_read(&self) -> bool {
        matches!(self, RingError::Pending { .. } | RingError::Overwritten { .. })
    }

    /// True when retrying the same index later can change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RingError::Pending { .. })
    }
}

pub type Result<T> = std::result::Result<T, RingError>;
