//! Block metadata: one machine word packing payload size and a free bit,
//! plus the free-list link threaded through a free block's own payload.
//!
//! This mirrors `alloc.c`'s `struct obj_metadata` exactly: size and the
//! free/allocated bit share one `usize`, and the free-list `next` pointer
//! lives in the first word of the payload — there is no separate node type.

use std::mem;
use std::ptr::NonNull;

/// Word alignment every block's payload is rounded up to.
pub const ALIGN: usize = mem::size_of::<usize>();

/// Smallest payload any block may have — large enough to host a free-list
/// link inside the payload area when the block is free.
pub const MIN_PAYLOAD: usize = 24;

/// Size of the header word itself.
pub const HEADER_SIZE: usize = mem::size_of::<usize>();

const FREE_BIT: usize = 1 << (usize::BITS - 1);
const SIZE_MASK: usize = !FREE_BIT;

/// Rounds `size` up to the next multiple of [`ALIGN`], after clamping it up
/// to [`MIN_PAYLOAD`]. Returns `None` if clamping and rounding would
/// overflow `usize` (a request within `ALIGN` of `usize::MAX`).
#[must_use]
pub fn normalize_size(size: usize) -> Option<usize> {
    let clamped = size.max(MIN_PAYLOAD);
    clamped.checked_add(ALIGN - 1).map(|rounded| rounded & !(ALIGN - 1))
}

/// A pointer to a block's header word. Cheap to copy; all accessors are
/// `unsafe` because they dereference raw memory the allocator owns.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockPtr(NonNull<u8>);

impl BlockPtr {
    /// Wraps a raw pointer to a block's header.
    ///
    /// # Safety
    /// `header` must point at the start of a live, well-formed block.
    pub unsafe fn new(header: NonNull<u8>) -> Self {
        Self(header)
    }

    /// Recovers the owning block from a pointer previously handed to a
    /// caller via [`BlockPtr::payload`].
    ///
    /// # Safety
    /// `payload` must be exactly the pointer `BlockPtr::payload` produced
    /// for some live block.
    pub unsafe fn from_payload(payload: NonNull<u8>) -> Self {
        // SAFETY: payload was produced by offsetting a header by
        // `HEADER_SIZE`; offsetting back recovers it.
        let header = unsafe { payload.as_ptr().sub(HEADER_SIZE) };
        Self(NonNull::new(header).expect("payload pointer underflowed"))
    }

    pub fn as_ptr(self) -> NonNull<u8> {
        self.0
    }

    fn info_ptr(self) -> *mut usize {
        self.0.as_ptr().cast::<usize>()
    }

    /// # Safety
    /// The block's header word must be initialized and readable.
    pub unsafe fn size(self) -> usize {
        unsafe { self.info_ptr().read() & SIZE_MASK }
    }

    /// # Safety
    /// The block's header word must be initialized and readable.
    pub unsafe fn is_free(self) -> bool {
        unsafe { self.info_ptr().read() & FREE_BIT != 0 }
    }

    /// # Safety
    /// The header word must be writable for the lifetime of the block.
    pub unsafe fn set(self, size: usize, free: bool) {
        let info = size | if free { FREE_BIT } else { 0 };
        unsafe {
            self.info_ptr().write(info);
        }
    }

    /// Pointer to the first byte of this block's payload, immediately
    /// following the header.
    pub fn payload(self) -> NonNull<u8> {
        // SAFETY: header and payload live in the same allocation.
        NonNull::new(unsafe { self.0.as_ptr().add(HEADER_SIZE) }).expect("non-null by construction")
    }

    /// The block physically adjacent to this one, starting right after
    /// this block's payload ends.
    ///
    /// # Safety
    /// The block's size must be valid and the next block must lie within
    /// the managed heap (caller checks against `heap_end` before reading
    /// through the result).
    pub unsafe fn next_physical(self, size: usize) -> BlockPtr {
        // SAFETY: `size` is this block's own payload size; header+size is
        // exactly this block's span, so the result starts at the next
        // block's header (or at `heap_end`, which the caller must check).
        let next = unsafe { self.payload().as_ptr().add(size) };
        BlockPtr(NonNull::new(next).expect("next_physical computed a null pointer"))
    }

    /// Reads the free-list `next` pointer stored in this (free) block's
    /// payload.
    ///
    /// # Safety
    /// The block must currently be free and its payload must be at least
    /// [`ALIGN`] bytes (guaranteed by [`MIN_PAYLOAD`]).
    pub unsafe fn free_next(self) -> Option<BlockPtr> {
        let slot = self.payload().as_ptr().cast::<usize>();
        // SAFETY: free blocks reserve their first `ALIGN` payload bytes for
        // this link.
        let raw = unsafe { slot.read() };
        NonNull::new(raw as *mut u8).map(BlockPtr)
    }

    /// Writes the free-list `next` pointer into this (free) block's payload.
    ///
    /// # Safety
    /// Same requirements as [`BlockPtr::free_next`].
    pub unsafe fn set_free_next(self, next: Option<BlockPtr>) {
        let slot = self.payload().as_ptr().cast::<usize>();
        let raw = next.map_or(0, |b| b.0.as_ptr() as usize);
        unsafe {
            slot.write(raw);
        }
    }
}
