// Layout conformance tests for processes sharing a ring by address.
// These assert the header offsets, slot offsets and the footprint formula,
// and print observed values to aid debugging on a given platform.
use dmxp_circular::MPMC::Buffer::layout::{Header, LAYOUT_VERSION, MAGIC_NUMBER};
use dmxp_circular::MPMC::Buffer::Slot;
use dmxp_circular::{CircularBuffer, Notify, RingError};
use memoffset::offset_of;
use std::alloc::{alloc, dealloc, Layout};
use std::mem::{align_of, size_of};
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

#[test]
fn test_header_layout() {
    let off_magic = offset_of!(Header, magic);
    let off_layout_version = offset_of!(Header, layout_version);
    let off_capacity = offset_of!(Header, capacity);
    let off_slot_size = offset_of!(Header, slot_size);
    let off_next_index = offset_of!(Header, next_index);

    println!(
        "Header => size: {}, align: {}, offsets: [magic:{off_magic}, layout_version:{off_layout_version}, capacity:{off_capacity}, slot_size:{off_slot_size}, next_index:{off_next_index}]",
        size_of::<Header>(),
        align_of::<Header>()
    );

    assert_eq!(off_magic, 0);
    assert_eq!(off_layout_version, 8);
    assert_eq!(off_capacity, 16);
    assert_eq!(off_slot_size, 24);
    // The cursor sits on its own cache line
    assert_eq!(off_next_index % align_of::<Header>(), 0);
    assert!(off_next_index >= 32);
    assert_eq!(size_of::<Header>() % align_of::<Header>(), 0);
}

#[test]
fn test_slot_layout() {
    type S = Slot<u64, AtomicU32>;
    let off_version = offset_of!(S, version);
    let off_value = offset_of!(S, value);

    println!(
        "Slot<u64> => size: {}, align: {}, offsets: [version:{off_version}, value:{off_value}]",
        size_of::<S>(),
        align_of::<S>()
    );

    assert_eq!(off_version, 0);
    assert_eq!(off_value, 8);
    assert_eq!(size_of::<S>(), 16);
    assert_eq!(CircularBuffer::<u64>::slot_stride(), 16);

    type Small = Slot<u8, AtomicU32>;
    assert_eq!(offset_of!(Small, value), 4);
    assert_eq!(size_of::<Small>(), 8);
}

#[test]
fn footprint_is_linear_in_capacity() {
    let base = CircularBuffer::<u64>::memory_footprint(0);
    let stride = CircularBuffer::<u64>::slot_stride();
    assert_eq!(base, CircularBuffer::<u64>::slots_offset());
    assert_eq!(base, size_of::<Header>());

    for capacity in [1usize, 2, 3, 7, 64, 1000, 4096] {
        let bytes = CircularBuffer::<u64>::memory_footprint(capacity);
        assert_eq!(bytes, base + capacity * stride);
        assert_eq!(bytes, CircularBuffer::<u64>::memory_footprint(capacity));
    }

    assert_eq!(
        CircularBuffer::<[u8; 3]>::memory_footprint(10),
        size_of::<Header>() + 10 * size_of::<Slot<[u8; 3], AtomicU32>>()
    );
    assert_eq!(CircularBuffer::<u64>::memory_footprint(usize::MAX), usize::MAX);
}

#[test]
fn heap_ring_header_is_readable_by_offset() {
    let rb = CircularBuffer::<u64>::new(5).unwrap();
    for i in 0..3 {
        rb.push(i, Notify::Silent);
    }

    let base = rb.as_ptr();
    unsafe {
        let header = &*(base as *const Header);
        assert_eq!(header.magic.load(Ordering::Acquire), MAGIC_NUMBER);
        assert_eq!(header.layout_version, LAYOUT_VERSION);
        assert_eq!(header.capacity, 5);
        assert_eq!(header.slot_size, CircularBuffer::<u64>::slot_stride() as u64);

        // Second slot: version 1, value 1
        let slot = base.add(CircularBuffer::<u64>::slots_offset() + CircularBuffer::<u64>::slot_stride());
        assert_eq!(*(slot as *const u32), 1);
        assert_eq!(*(slot.add(8) as *const u64), 1);
    }
}

fn make_aligned_backing(size: usize, align: usize) -> (*mut u8, Layout) {
    let layout = Layout::from_size_align(size, align).unwrap();
    let ptr = unsafe { alloc(layout) };
    if ptr.is_null() {
        panic!("Failed to allocate aligned memory");
    }
    (ptr, layout)
}

#[test]
fn init_and_attach_in_place() {
    let capacity = 6;
    let size = CircularBuffer::<u64>::memory_footprint(capacity);
    let (ptr, layout) = make_aligned_backing(size, CircularBuffer::<u64>::required_align());

    {
        let writer = unsafe { CircularBuffer::<u64>::init_in_place(ptr, size, capacity) }.unwrap();
        let viewer = unsafe { CircularBuffer::<u64>::attach_in_place(ptr, size) }.unwrap();
        assert_eq!(viewer.capacity(), capacity);

        for i in 0..8u64 {
            writer.push(i + 100, Notify::Silent);
        }
        assert_eq!(viewer.size(), 8);
        assert_eq!(viewer.read(7).unwrap(), 107);
        assert!(viewer.read(1).is_err());
        assert_eq!(viewer.read(2).unwrap(), 102);
    }

    unsafe { dealloc(ptr, layout) };
}

#[test]
fn in_place_rejects_bad_regions() {
    let capacity = 4;
    let size = CircularBuffer::<u64>::memory_footprint(capacity);
    let align = CircularBuffer::<u64>::required_align();
    let (ptr, layout) = make_aligned_backing(size + align, align);

    unsafe {
        let err = CircularBuffer::<u64>::init_in_place(ptr, size - 1, capacity).unwrap_err();
        assert!(matches!(err, RingError::RegionTooSmall { .. }));

        let err = CircularBuffer::<u64>::init_in_place(ptr.add(1), size, capacity).unwrap_err();
        assert!(matches!(err, RingError::Misaligned { .. }));

        let err = CircularBuffer::<u64>::init_in_place(ptr, size, 0).unwrap_err();
        assert!(matches!(err, RingError::ZeroCapacity));

        // Never initialized: magic is missing
        std::ptr::write_bytes(ptr, 0, size);
        let err = CircularBuffer::<u64>::attach_in_place(ptr, size).unwrap_err();
        assert!(matches!(err, RingError::LayoutMismatch(_)));

        // Initialized for u64, attached as [u64; 2]
        drop(CircularBuffer::<u64>::init_in_place(ptr, size, capacity).unwrap());
        let err = CircularBuffer::<[u64; 2]>::attach_in_place(ptr, size).unwrap_err();
        assert!(matches!(err, RingError::LayoutMismatch(_)));

        // Region cut shorter than the header claims
        let err = CircularBuffer::<u64>::attach_in_place(ptr, size - 8).unwrap_err();
        assert!(matches!(err, RingError::RegionTooSmall { .. }));

        dealloc(ptr, layout);
    }
}

#[test]
fn attach_sees_header_published_by_another_thread() {
    let capacity = 12;
    let size = CircularBuffer::<u64>::memory_footprint(capacity);
    let (ptr, layout) = make_aligned_backing(size, CircularBuffer::<u64>::required_align());
    unsafe { std::ptr::write_bytes(ptr, 0, size) };
    let addr = ptr as usize;

    let writer = thread::spawn(move || {
        let ring = unsafe { CircularBuffer::<u64>::init_in_place(addr as *mut u8, size, capacity) }
            .unwrap();
        ring.push(77, Notify::Silent);
    });

    // Spin until the magic shows up; everything written before it must be visible
    let viewer = loop {
        match unsafe { CircularBuffer::<u64>::attach_in_place(ptr, size) } {
            Ok(ring) => break ring,
            Err(RingError::LayoutMismatch(_)) => std::hint::spin_loop(),
            Err(e) => panic!("unexpected attach error: {e}"),
        }
    };
    assert_eq!(viewer.capacity(), capacity);

    writer.join().unwrap();
    assert_eq!(viewer.read(0).unwrap(), 77);
    drop(viewer);

    unsafe { dealloc(ptr, layout) };
}
