//! End-to-end scenarios and universal properties for `BlockAllocator`.

use blockkv_alloc::{AllocError, BlockAllocator, MmapHeapGrow};
use blockkv_alloc::header::{self, HEADER_SIZE};

fn fresh() -> BlockAllocator<MmapHeapGrow> {
    BlockAllocator::new(MmapHeapGrow::new().expect("reserve heap"))
}

#[test]
fn alloc_zero_returns_none() {
    let mut a = fresh();
    assert!(a.alloc(0).unwrap().is_none());
}

#[test]
fn alloc_near_usize_max_overflows_cleanly() {
    let mut a = fresh();
    assert_eq!(a.alloc(usize::MAX).unwrap_err(), AllocError::SizeOverflow);
}

#[test]
fn allocations_are_aligned_and_disjoint() {
    let mut a = fresh();
    let p1 = a.alloc(16).unwrap().unwrap();
    let p2 = a.alloc(40).unwrap().unwrap();
    let p3 = a.alloc(100).unwrap().unwrap();

    for p in [p1, p2, p3] {
        assert_eq!(p.as_ptr() as usize % header::ALIGN, 0, "payload must be word-aligned");
    }
    assert_ne!(p1.as_ptr(), p2.as_ptr());
    assert_ne!(p2.as_ptr(), p3.as_ptr());
    assert_ne!(p1.as_ptr(), p3.as_ptr());

    unsafe {
        std::ptr::write_bytes(p1.as_ptr(), 0xAA, 16);
        std::ptr::write_bytes(p2.as_ptr(), 0xBB, 40);
        std::ptr::write_bytes(p3.as_ptr(), 0xCC, 100);
        assert_eq!(*p1.as_ptr(), 0xAA);
        assert_eq!(*p2.as_ptr(), 0xBB);
        assert_eq!(*p3.as_ptr(), 0xCC);
    }
}

/// Scenario 1: alloc(16)=p1; alloc(40)=p2; release(p1); release(p2) — after
/// both releases the heap is one coalesced free block.
#[test]
fn release_coalesces_forward() {
    let mut a = fresh();
    let p1 = a.alloc(16).unwrap().unwrap();
    let p2 = a.alloc(40).unwrap().unwrap();

    a.release(Some(p1));
    a.release(Some(p2));

    let blocks = a.walk_blocks();
    assert_eq!(blocks.len(), 1, "both blocks must have merged into one");
    assert!(blocks[0].2, "merged block must be free");
}

/// Scenario 2: alloc(32)=p; release(p); alloc(32)=q => q == p (LIFO reuse).
#[test]
fn release_then_realloc_reuses_block() {
    let mut a = fresh();
    let p = a.alloc(32).unwrap().unwrap();
    a.release(Some(p));
    let q = a.alloc(32).unwrap().unwrap();
    assert_eq!(p.as_ptr(), q.as_ptr());
}

/// Scenario 3: alloc(100)=a; alloc(8)=b; release(a); alloc(16)=c => c==a,
/// remainder split off when large enough.
#[test]
fn release_and_realloc_splits_when_remainder_fits() {
    let mut a = fresh();
    let a1 = a.alloc(100).unwrap().unwrap();
    let _b = a.alloc(8).unwrap().unwrap();
    a.release(Some(a1));
    let c = a.alloc(16).unwrap().unwrap();

    assert_eq!(a1.as_ptr(), c.as_ptr());

    let remainder_size = header::normalize_size(100).unwrap() - header::normalize_size(16).unwrap() - HEADER_SIZE;
    if remainder_size >= header::MIN_PAYLOAD {
        let stats = a.stats();
        assert!(stats.free_blocks >= 1, "remainder should have been split back onto the free list");
    }
}

#[test]
fn every_free_block_meets_minimum_payload() {
    let mut a = fresh();
    let p = a.alloc(8).unwrap().unwrap(); // clamped up to MIN_PAYLOAD
    a.release(Some(p));

    for (_, size, free) in a.walk_blocks() {
        if free {
            assert!(size >= header::MIN_PAYLOAD);
        }
    }
}

#[test]
fn walk_visits_every_block_and_ends_at_heap_end() {
    let mut a = fresh();
    let _p1 = a.alloc(20).unwrap().unwrap();
    let p2 = a.alloc(60).unwrap().unwrap();
    let _p3 = a.alloc(10).unwrap().unwrap();
    a.release(Some(p2));

    let blocks = a.walk_blocks();
    assert_eq!(blocks.len(), 3, "two live allocations plus the freed middle block");
    assert!(!blocks[0].2 && blocks[1].2 && !blocks[2].2);
}

#[test]
fn release_of_null_is_a_no_op() {
    let mut a = fresh();
    a.release(None);
    assert_eq!(a.stats().bytes_in_use, 0);
}

#[test]
fn no_two_adjacent_free_blocks_after_many_releases() {
    let mut a = fresh();
    let mut ptrs = Vec::new();
    for i in 0..20 {
        ptrs.push(a.alloc(16 + i).unwrap().unwrap());
    }
    for p in ptrs {
        a.release(Some(p));
    }

    let blocks = a.walk_blocks();
    for w in blocks.windows(2) {
        assert!(!(w[0].2 && w[1].2), "two adjacent free blocks violate the coalescing invariant");
    }
}
