// C ABI over a shared-memory ring of u64 values.

use crate::error::RingError;
use crate::MPMC::Buffer::CircularBuffer;
use crate::MPMC::Structs::Notify;
use std::ffi::{c_char, CStr};
use std::ptr;

// Error codes
const DMXP_SUCCESS: i32 = 0;
const DMXP_ERROR_NULL_POINTER: i32 = -1;
const DMXP_ERROR_INVALID_ARG: i32 = -2;
const DMXP_ERROR_ALLOCATION_FAILED: i32 = -3;
const DMXP_ERROR_PENDING: i32 = -4;
const DMXP_ERROR_OVERWRITTEN: i32 = -5;
const DMXP_ERROR_INTERNAL: i32 = -6;

/// Handle to a ring instance (opaque pointer)
pub struct RingHandle {
    inner: CircularBuffer<u64>,
}

fn error_code(err: &RingError) -> i32 {
    match err {
        RingError::Pending { .. } => DMXP_ERROR_PENDING,
        RingError::Overwritten { .. } => DMXP_ERROR_OVERWRITTEN,
        RingError::ZeroCapacity
        | RingError::CapacityOverflow { .. }
        | RingError::MissingName
        | RingError::Misaligned { .. } => DMXP_ERROR_INVALID_ARG,
        RingError::RegionTooSmall { .. } | RingError::Io(_) => DMXP_ERROR_ALLOCATION_FAILED,
        RingError::LayoutMismatch(_) => DMXP_ERROR_INTERNAL,
    }
}

unsafe fn name_from_c<'a>(name: *const c_char) -> Option<&'a str> {
    if name.is_null() {
        return None;
    }
    CStr::from_ptr(name).to_str().ok()
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Create a ring in the shared memory segment `name`.
///
/// # Arguments
/// * `name` - NUL-terminated segment name (file under /dev/shm).
/// * `capacity` - Number of slots (any positive value).
///
/// # Returns
/// * Pointer to `RingHandle`, or NULL on failure.
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_create(name: *const c_char, capacity: usize) -> *mut RingHandle {
    let Some(name) = name_from_c(name) else {
        tracing::error!("dmxp_ring_create: invalid name");
        return ptr::null_mut();
    };

    match CircularBuffer::create_shared(name, capacity) {
        Ok(ring) => Box::into_raw(Box::new(RingHandle { inner: ring })),
        Err(e) => {
            tracing::error!(name, capacity, error = %e, "dmxp_ring_create failed");
            ptr::null_mut()
        }
    }
}

/// Attach to a ring previously created in the shared memory segment `name`.
///
/// # Returns
/// * Pointer to `RingHandle`, or NULL on failure.
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_attach(name: *const c_char) -> *mut RingHandle {
    let Some(name) = name_from_c(name) else {
        tracing::error!("dmxp_ring_attach: invalid name");
        return ptr::null_mut();
    };

    match CircularBuffer::attach_shared(name) {
        Ok(ring) => Box::into_raw(Box::new(RingHandle { inner: ring })),
        Err(e) => {
            tracing::error!(name, error = %e, "dmxp_ring_attach failed");
            ptr::null_mut()
        }
    }
}

/// Free a ring handle. The shared memory segment itself is left in place.
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_free(handle: *mut RingHandle) {
    if !handle.is_null() {
        let _ = Box::from_raw(handle); // Dropped automatically
    }
}

// -----------------------------------------------------------------------------
// Producer API
// -----------------------------------------------------------------------------

/// Publish `value`.
///
/// # Arguments
/// * `handle` - Pointer to `RingHandle`.
/// * `value` - Value to publish.
/// * `notify` - Non-zero to wake blocked waiters.
/// * `out_index` - Receives the logical index (may be NULL).
///
/// # Returns
/// * 0 on success, negative error code otherwise.
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_push(
    handle: *mut RingHandle,
    value: u64,
    notify: i32,
    out_index: *mut u64,
) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }

    let ring = &(*handle).inner;
    let index = ring.push(value, Notify::from(notify != 0));
    if !out_index.is_null() {
        *out_index = index;
    }
    DMXP_SUCCESS
}

// -----------------------------------------------------------------------------
// Consumer API
// -----------------------------------------------------------------------------

/// Read the value published at `index` into `out_value`.
///
/// # Returns
/// * 0 on success, `-4` if not yet published, `-5` if overwritten.
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_read(
    handle: *const RingHandle,
    index: u64,
    out_value: *mut u64,
) -> i32 {
    if handle.is_null() || out_value.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }

    match (*handle).inner.read(index) {
        Ok(value) => {
            *out_value = value;
            DMXP_SUCCESS
        }
        Err(e) => error_code(&e),
    }
}

/// Block until `index` is published (or overwritten).
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_wait(handle: *const RingHandle, index: u64) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    (*handle).inner.wait(index);
    DMXP_SUCCESS
}

/// Number of indices allocated so far, or 0 for a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_size(handle: *const RingHandle) -> u64 {
    if handle.is_null() {
        return 0;
    }
    (*handle).inner.size()
}

/// Capacity in slots, or 0 for a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn dmxp_ring_capacity(handle: *const RingHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).inner.capacity()
}

/// Bytes a ring of `capacity` u64 slots occupies.
#[no_mangle]
pub extern "C" fn dmxp_ring_memory_footprint(capacity: usize) -> usize {
    CircularBuffer::<u64>::memory_footprint(capacity)
}
