//! The allocator core: first-fit selection, boundary splitting, and
//! forward-only coalescing over a singly linked free list.
//!
//! Faithful to `alloc.c`'s `mymalloc`/`myfree`: the only structural change
//! is that "grow the heap" is a pluggable [`HeapGrow`](crate::growth::HeapGrow)
//! instead of a hardcoded `sbrk` call.

use std::ptr::NonNull;

use crate::error::{AllocError, AllocResult};
use crate::growth::HeapGrow;
use crate::header::{self, BlockPtr, HEADER_SIZE};

/// A snapshot of the allocator's current occupancy, taken under whatever
/// lock guards the allocator (see [`crate::shared::SharedBlockAllocator`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Bytes currently handed out to callers (payload only, headers excluded).
    pub bytes_in_use: usize,
    /// Number of blocks currently on the free list.
    pub free_blocks: usize,
    /// Total bytes ever grown from the heap primitive.
    pub heap_span: usize,
}

/// A first-fit allocator over a grow-only heap region.
///
/// Not `Sync`: spec.md §9 flags this explicitly — callers sharing one
/// allocator across threads must wrap it (see
/// [`crate::shared::SharedBlockAllocator`]).
pub struct BlockAllocator<G: HeapGrow> {
    grow: G,
    free_list: Option<BlockPtr>,
}

impl<G: HeapGrow> BlockAllocator<G> {
    /// Builds an allocator over the given heap-grow primitive. No memory is
    /// reserved from `grow` until the first `alloc` call needs it.
    pub fn new(grow: G) -> Self {
        Self { grow, free_list: None }
    }

    /// Returns at least `n` bytes, aligned to [`header::ALIGN`].
    ///
    /// `n == 0` yields `Ok(None)` (a no-op, not an error); a request so large
    /// that alignment or header bookkeeping would overflow `usize` yields
    /// `Err(AllocError::SizeOverflow)`; a heap-grow failure yields
    /// `Err(AllocError::HeapExhausted)`.
    pub fn alloc(&mut self, n: usize) -> AllocResult<Option<NonNull<u8>>> {
        if n == 0 {
            return Ok(None);
        }
        let size = header::normalize_size(n).ok_or(AllocError::SizeOverflow)?;

        if let Some(block) = self.find_fit(size) {
            self.remove_from_free_list(block);
            let split = self.maybe_split(block, size);
            blockkv_log::debug!(size, split, "allocation satisfied from free list");
            return Ok(Some(block.payload()));
        }

        let grow_request = size.checked_add(HEADER_SIZE).ok_or(AllocError::SizeOverflow)?;
        let grown = self
            .grow
            .grow(grow_request)
            .ok_or(AllocError::HeapExhausted { requested: grow_request })?;
        // SAFETY: `grown` is a fresh, exclusively-owned range of at least
        // `size + HEADER_SIZE` bytes, per `HeapGrow`'s contract.
        let block = unsafe { BlockPtr::new(grown) };
        // SAFETY: header word is within the freshly grown range.
        unsafe {
            block.set(size, false);
        }
        blockkv_log::debug!(size, "allocation grew the heap");
        Ok(Some(block.payload()))
    }

    /// Returns the block containing `p` to the allocator, coalescing
    /// forward with any free physical neighbor. A `None` pointer is a no-op;
    /// double-release is undefined, matching spec.md.
    pub fn release(&mut self, p: Option<NonNull<u8>>) {
        let Some(p) = p else { return };
        // SAFETY: caller contract — `p` was returned by a prior `alloc` on
        // this allocator and has not already been released.
        let block = unsafe { BlockPtr::from_payload(p) };
        self.push_free(block);
        self.coalesce_forward(block);
    }

    /// Snapshot of current occupancy, walking the free list and the grow
    /// primitive's recorded span.
    pub fn stats(&self) -> AllocatorStats {
        let mut free_blocks = 0usize;
        let mut free_bytes = 0usize;
        let mut cur = self.free_list;
        while let Some(b) = cur {
            free_blocks += 1;
            // SAFETY: every node on the free list is a well-formed block.
            free_bytes += unsafe { b.size() };
            cur = unsafe { b.free_next() };
        }
        let heap_span = match (self.grow.heap_start(), self.grow.heap_end()) {
            (Some(start), Some(end)) => end.as_ptr() as usize - start.as_ptr() as usize,
            _ => 0,
        };
        AllocatorStats {
            bytes_in_use: heap_span.saturating_sub(free_bytes),
            free_blocks,
            heap_span,
        }
    }

    /// Walks every block from `heap_start` to `heap_end` in physical order.
    /// Used by tests to check the "no gaps, visits every block once"
    /// invariant; not part of the allocator's steady-state hot path.
    pub fn walk_blocks(&self) -> Vec<(NonNull<u8>, usize, bool)> {
        let mut out = Vec::new();
        let (Some(start), Some(end)) = (self.grow.heap_start(), self.grow.heap_end()) else {
            return out;
        };
        let mut cur = unsafe { BlockPtr::new(start) };
        loop {
            // SAFETY: within the loop, `cur` always points at the start of
            // a well-formed block inside `[start, end)`.
            let size = unsafe { cur.size() };
            let free = unsafe { cur.is_free() };
            out.push((cur.as_ptr(), size, free));
            let next = unsafe { cur.next_physical(size) };
            if next.as_ptr().as_ptr() as usize >= end.as_ptr() as usize {
                break;
            }
            cur = next;
        }
        out
    }

    fn find_fit(&self, size: usize) -> Option<BlockPtr> {
        let mut cur = self.free_list;
        while let Some(b) = cur {
            // SAFETY: list nodes are well-formed free blocks.
            if unsafe { b.size() } >= size {
                return Some(b);
            }
            cur = unsafe { b.free_next() };
        }
        None
    }

    fn push_free(&mut self, block: BlockPtr) {
        // SAFETY: `block` is a live block this allocator owns.
        unsafe {
            block.set_free_next(self.free_list);
            block.set(block.size(), true);
        }
        self.free_list = Some(block);
    }

    fn remove_from_free_list(&mut self, target: BlockPtr) {
        let Some(head) = self.free_list else { return };
        if head == target {
            self.free_list = unsafe { head.free_next() };
        } else {
            let mut cur = head;
            loop {
                let Some(next) = (unsafe { cur.free_next() }) else { return };
                if next == target {
                    unsafe {
                        cur.set_free_next(next.free_next());
                    }
                    break;
                }
                cur = next;
            }
        }
        // SAFETY: `target` was on the free list; mark it allocated, keeping
        // its current size — the caller decides whether to split it.
        unsafe {
            target.set(target.size(), false);
        }
    }

    /// Splits `block` (already marked allocated, payload `S`) down to
    /// payload `request` if the remainder can host another block, pushing
    /// the remainder onto the free list head.
    fn maybe_split(&mut self, block: BlockPtr, request: usize) -> bool {
        // SAFETY: `block` is a live, just-removed-from-free-list block.
        let total = unsafe { block.size() };
        if total < request + HEADER_SIZE + header::MIN_PAYLOAD {
            return false;
        }
        let remainder_size = total - request - HEADER_SIZE;
        // SAFETY: `remainder` starts exactly `request` bytes into `block`'s
        // payload, which is within `block`'s own span (checked above).
        let remainder = unsafe { block.next_physical(request) };
        unsafe {
            remainder.set(remainder_size, true);
            block.set(request, false);
        }
        self.push_free(remainder);
        true
    }

    fn coalesce_forward(&mut self, mut block: BlockPtr) {
        let Some(heap_end) = self.grow.heap_end() else { return };
        loop {
            // SAFETY: `block` is a live, well-formed block whose size is
            // current as of this iteration.
            let size = unsafe { block.size() };
            let next = unsafe { block.next_physical(size) };
            if next.as_ptr().as_ptr() as usize >= heap_end.as_ptr() as usize {
                break;
            }
            // SAFETY: `next` lies within the managed heap, so it is a
            // well-formed block.
            if !unsafe { next.is_free() } {
                break;
            }
            self.remove_from_free_list(next);
            let next_size = unsafe { next.size() };
            unsafe {
                block.set(size + HEADER_SIZE + next_size, true);
            }
        }
    }
}
