use dmxp_circular::{CircularBuffer, LocalCell, Notify, RingError};

#[test]
fn sequential_pushes_read_back_in_order() {
    let capacity = 16;
    let rb = CircularBuffer::<u64>::new(capacity).unwrap();

    for i in 0..capacity as u64 {
        let idx = rb.push(i * 10, Notify::Silent);
        assert_eq!(idx, i);
    }

    for i in 0..capacity as u64 {
        assert_eq!(rb.read(i).unwrap(), i * 10);
    }
    assert_eq!(rb.size(), capacity as u64);
}

#[test]
fn partial_fill_reads_back() {
    let rb = CircularBuffer::<u32>::new(8).unwrap();
    for v in [7, 8, 9] {
        rb.push(v, Notify::Silent);
    }
    assert_eq!(rb.read(0).unwrap(), 7);
    assert_eq!(rb.read(1).unwrap(), 8);
    assert_eq!(rb.read(2).unwrap(), 9);
    assert!(matches!(rb.read(3), Err(RingError::Pending { index: 3 })));
}

#[test]
fn wrap_overwrites_oldest() {
    let capacity = 4;
    let rb = CircularBuffer::<u64>::new(capacity).unwrap();

    for i in 0..=capacity as u64 {
        rb.push(i, Notify::Silent);
    }

    let err = rb.read(0).unwrap_err();
    assert!(matches!(err, RingError::Overwritten { index: 0 }));
    assert!(err.is_invalid_read());
    assert!(!err.is_retryable());

    for i in 1..=capacity as u64 {
        assert_eq!(rb.read(i).unwrap(), i);
    }
}

#[test]
fn five_strings_into_four_slots() {
    let rb = CircularBuffer::<&'static str>::new(4).unwrap();
    for s in ["a", "b", "c", "d", "e"] {
        rb.push(s, Notify::Wake);
    }

    assert_eq!(rb.read(4).unwrap(), "e");
    assert!(rb.read(0).is_err());
    assert_eq!(rb.read(1).unwrap(), "b");
}

#[test]
fn unreached_index_is_pending() {
    let rb = CircularBuffer::<u64>::new(4).unwrap();
    rb.push(1, Notify::Silent);

    let err = rb.read(9).unwrap_err();
    assert!(matches!(err, RingError::Pending { index: 9 }));
    assert!(err.is_invalid_read());
    assert!(err.is_retryable());
}

#[test]
fn far_future_index_is_pending() {
    let rb = CircularBuffer::<u64>::new(1).unwrap();
    rb.push(7, Notify::Silent);

    // More than 2^31 generations ahead of the slot's version
    for index in [3u64 << 30, 1 << 31, (1 << 32) + 1, u64::MAX / 2] {
        let err = rb.read(index).unwrap_err();
        assert!(matches!(err, RingError::Pending { .. }), "index {index}: {err}");
        assert!(err.is_retryable());
    }
    assert_eq!(rb.read(0).unwrap(), 7);
}

#[test]
fn allocate_then_commit() {
    let rb = CircularBuffer::<[u32; 4]>::new(8).unwrap();

    let mut reservation = rb.allocate();
    let idx = reservation.index();
    assert_eq!(idx, 0);
    reservation.write([1, 2, 3, 4]);

    // Allocated but not committed
    assert!(matches!(rb.read(idx), Err(RingError::Pending { .. })));
    assert_eq!(rb.size(), 1);

    rb.commit(idx, Notify::Silent);
    assert_eq!(rb.read(idx).unwrap(), [1, 2, 3, 4]);
}

#[test]
fn reservation_builds_value_in_place() {
    let rb = CircularBuffer::<[u8; 64]>::new(2).unwrap();

    let mut reservation = rb.allocate();
    let slot = reservation.as_mut_ptr();
    unsafe {
        std::ptr::write_bytes(slot, 0xAB, 1);
        (*slot)[0] = 1;
    }
    let idx = reservation.commit(Notify::Wake);

    let value = rb.read(idx).unwrap();
    assert_eq!(value[0], 1);
    assert!(value[1..].iter().all(|&b| b == 0xAB));
}

#[test]
fn size_counts_overwritten_entries() {
    let rb = CircularBuffer::<u8>::new(3).unwrap();
    for i in 0..10u8 {
        rb.push(i, Notify::Silent);
        assert_eq!(rb.size(), i as u64 + 1);
        assert_eq!(rb.capacity(), 3);
    }
    assert_eq!(rb.oldest_index(), 7);
}

#[test]
fn non_power_of_two_capacity() {
    let capacity = 7;
    let rb = CircularBuffer::<u64>::new(capacity).unwrap();

    for i in 0..30u64 {
        rb.push(i * i, Notify::Silent);
    }

    for i in 0..23u64 {
        assert!(rb.read(i).is_err(), "index {i} should be gone");
    }
    for i in 23..30u64 {
        assert_eq!(rb.read(i).unwrap(), i * i);
    }
}

#[test]
fn capacity_one_keeps_only_latest() {
    let rb = CircularBuffer::<i64>::new(1).unwrap();
    rb.push(-1, Notify::Silent);
    assert_eq!(rb.read(0).unwrap(), -1);
    rb.push(-2, Notify::Silent);
    assert!(rb.read(0).is_err());
    assert_eq!(rb.read(1).unwrap(), -2);
}

#[test]
fn zero_capacity_is_rejected() {
    let err = CircularBuffer::<u64>::new(0).unwrap_err();
    assert!(matches!(err, RingError::ZeroCapacity));
}

#[test]
fn huge_capacity_overflows() {
    let err = CircularBuffer::<[u64; 32]>::new(usize::MAX).unwrap_err();
    assert!(matches!(err, RingError::CapacityOverflow { .. }));
}

#[test]
fn unchecked_access_aliases_slots() {
    let mut rb = CircularBuffer::<u64>::new(4).unwrap();
    for i in 0..4u64 {
        rb.push(100 + i, Notify::Silent);
    }

    unsafe {
        assert_eq!(*rb.get(2), 102);
        // Index 6 maps onto the same physical slot as 2
        assert_eq!(*rb.get(6), 102);
        *rb.get_mut(3) = 7;
    }
    assert_eq!(rb.read(3).unwrap(), 7);
}

#[test]
fn random_capacities_keep_the_last_window() {
    let mut rng = fastrand::Rng::with_seed(0x5EED);
    for _ in 0..50 {
        let capacity = rng.usize(1..64);
        let pushes = rng.u64(0..256);
        let rb = CircularBuffer::<u64>::new(capacity).unwrap();
        for i in 0..pushes {
            rb.push(i ^ 0xFFFF, Notify::Silent);
        }

        let oldest = pushes.saturating_sub(capacity as u64);
        for i in 0..pushes {
            let got = rb.read(i);
            if i >= oldest {
                assert_eq!(got.unwrap(), i ^ 0xFFFF);
            } else {
                assert!(matches!(got, Err(RingError::Overwritten { .. })));
            }
        }
        assert!(matches!(rb.read(pushes), Err(RingError::Pending { .. })));
    }
}

#[test]
fn deterministic_local_cell_ring() {
    let rb = CircularBuffer::<u16, LocalCell>::new(2).unwrap();
    let a = rb.push(1, Notify::Wake);
    let b = rb.push(2, Notify::Wake);

    // Already published; must not block
    rb.wait(a);
    rb.wait(b);
    assert_eq!(rb.read(a).unwrap(), 1);
    assert_eq!(rb.read(b).unwrap(), 2);

    rb.push(3, Notify::Wake);
    assert!(matches!(rb.read(a), Err(RingError::Overwritten { index: 0 })));
    assert_eq!(rb.read(2).unwrap(), 3);
}

#[test]
#[should_panic(expected = "would block forever")]
fn local_cell_wait_on_unpublished_panics() {
    let rb = CircularBuffer::<u16, LocalCell>::new(2).unwrap();
    rb.wait(0);
}
