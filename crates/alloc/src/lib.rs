//! A freestanding, first-fit block allocator over a grow-only heap region.
//!
//! Ported from a C excerpt (`alloc.c`: metadata packing, free-list
//! bookkeeping, split/coalesce, `mymalloc`/`myfree`) with the "grow the
//! heap" primitive turned into the [`growth::HeapGrow`] trait so the core
//! allocation algorithm doesn't know or care whether memory came from
//! `mmap`, `VirtualAlloc`, or a test double.
//!
//! ```
//! use blockkv_alloc::{BlockAllocator, MmapHeapGrow};
//!
//! let mut alloc = BlockAllocator::new(MmapHeapGrow::new().unwrap());
//! let p = alloc.alloc(64).unwrap().unwrap();
//! alloc.release(Some(p));
//! ```

pub mod allocator;
pub mod error;
pub mod growth;
pub mod header;
pub mod shared;

pub use allocator::{AllocatorStats, BlockAllocator};
pub use error::{AllocError, AllocResult};
pub use growth::{HeapGrow, MmapHeapGrow};
pub use shared::SharedBlockAllocator;
