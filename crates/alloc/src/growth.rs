//! The heap-grow primitive.
//!
//! `spec.md` §6 treats "grow the managed address range by N bytes" as an
//! external collaborator the allocator core merely calls. [`HeapGrow`] is
//! that seam; [`MmapHeapGrow`] is a concrete, OS-backed implementation used
//! by tests and the demonstration server, built the same way the grounding
//! repo's `syscalls::direct` module wraps `mmap`/`VirtualAlloc`: reserve a
//! big virtual region once, then hand out monotonically increasing slices
//! of it.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Extends a contiguous, process-wide address region monotonically.
///
/// # Safety
///
/// Implementors must guarantee that every byte in
/// `[start, start + total_grown)` is valid for reads and writes once
/// returned by a successful `grow` call, and that the region never moves —
/// `BlockAllocator` keeps raw pointers into it across calls.
pub unsafe trait HeapGrow: Send + Sync {
    /// Grows the region by exactly `n` bytes and returns the start of the
    /// newly available range (the old end), or `None` if growth failed.
    fn grow(&self, n: usize) -> Option<NonNull<u8>>;

    /// The address of the first byte ever handed out, once any growth has
    /// succeeded.
    fn heap_start(&self) -> Option<NonNull<u8>>;

    /// The current end of the grown region (one past the last valid byte).
    fn heap_end(&self) -> Option<NonNull<u8>>;
}

/// Reserves `capacity` bytes of anonymous virtual memory up front and grows
/// into it monotonically.
///
/// Reserving virtual address space is cheap and does not commit physical
/// memory until pages are actually touched, so a generous `capacity` (the
/// default is 1 GiB) costs nothing until the allocator really uses it.
pub struct MmapHeapGrow {
    base: NonNull<u8>,
    capacity: usize,
    used: AtomicUsize,
}

// SAFETY: `base` points at a region this type exclusively owns for its
// lifetime; sharing `&MmapHeapGrow` across threads only ever advances
// `used` atomically and never aliases mutable ranges.
unsafe impl Send for MmapHeapGrow {}
unsafe impl Sync for MmapHeapGrow {}

/// Default reservation size: large enough that realistic allocator
/// workloads in tests and demos never hit it, small enough to reserve
/// instantly.
pub const DEFAULT_CAPACITY: usize = 1 << 30;

impl MmapHeapGrow {
    /// Reserves [`DEFAULT_CAPACITY`] bytes of address space.
    pub fn new() -> std::io::Result<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Reserves exactly `capacity` bytes of address space.
    pub fn with_capacity(capacity: usize) -> std::io::Result<Self> {
        let base = platform::reserve(capacity)?;
        Ok(Self { base, capacity, used: AtomicUsize::new(0) })
    }
}

impl Drop for MmapHeapGrow {
    fn drop(&mut self) {
        // SAFETY: `base`/`capacity` describe exactly the region `reserve`
        // returned; no outstanding references survive past `Drop` because
        // `HeapGrow` implementors guarantee the region is only ever freed
        // at end of process in this crate's usage (allocators built on top
        // own the `MmapHeapGrow` for their whole lifetime).
        unsafe { platform::release(self.base, self.capacity) };
    }
}

unsafe impl HeapGrow for MmapHeapGrow {
    fn grow(&self, n: usize) -> Option<NonNull<u8>> {
        if n == 0 {
            return None;
        }
        let mut current = self.used.load(Ordering::Acquire);
        loop {
            let new_used = current.checked_add(n)?;
            if new_used > self.capacity {
                return None;
            }
            match self.used.compare_exchange_weak(
                current,
                new_used,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    // SAFETY: `current` stays within `[0, capacity]` and the
                    // whole reservation is valid read/write memory.
                    let ptr = unsafe { self.base.as_ptr().add(current) };
                    return NonNull::new(ptr);
                }
                Err(observed) => current = observed,
            }
        }
    }

    fn heap_start(&self) -> Option<NonNull<u8>> {
        if self.used.load(Ordering::Acquire) == 0 {
            None
        } else {
            Some(self.base)
        }
    }

    fn heap_end(&self) -> Option<NonNull<u8>> {
        let used = self.used.load(Ordering::Acquire);
        if used == 0 {
            None
        } else {
            // SAFETY: `used <= capacity`, within the reserved region.
            NonNull::new(unsafe { self.base.as_ptr().add(used) })
        }
    }
}

#[cfg(unix)]
mod platform {
    use std::io;
    use std::ptr::{self, NonNull};

    pub fn reserve(capacity: usize) -> io::Result<NonNull<u8>> {
        // SAFETY: anonymous, private mapping with no backing file; `addr`
        // is null so the OS chooses the location. `capacity` is caller
        // supplied and validated to be non-zero by `MmapHeapGrow`'s caller
        // (`DEFAULT_CAPACITY` or an explicit positive value).
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANON,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            Err(io::Error::last_os_error())
        } else {
            Ok(NonNull::new(ptr.cast::<u8>()).expect("mmap returned null without MAP_FAILED"))
        }
    }

    /// # Safety
    /// `base`/`len` must describe exactly one region returned by [`reserve`].
    pub unsafe fn release(base: NonNull<u8>, len: usize) {
        unsafe {
            libc::munmap(base.as_ptr().cast::<libc::c_void>(), len);
        }
    }
}

#[cfg(windows)]
mod platform {
    use std::io;
    use std::ptr::{self, NonNull};

    use winapi::um::memoryapi::{VirtualAlloc, VirtualFree};
    use winapi::um::winnt::{MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE};

    pub fn reserve(capacity: usize) -> io::Result<NonNull<u8>> {
        // SAFETY: reserving and committing a fresh region; `capacity` is
        // validated non-zero by the caller.
        let ptr = unsafe {
            VirtualAlloc(
                ptr::null_mut(),
                capacity,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };
        NonNull::new(ptr.cast::<u8>()).ok_or_else(io::Error::last_os_error)
    }

    /// # Safety
    /// `base` must describe exactly one region returned by [`reserve`].
    pub unsafe fn release(base: NonNull<u8>, _len: usize) {
        unsafe {
            VirtualFree(base.as_ptr().cast(), 0, MEM_RELEASE);
        }
    }
}
