//! Error type for [`BlockAllocator`](crate::allocator::BlockAllocator) operations.

use thiserror::Error;

/// Failure modes surfaced by this crate.
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The heap-grow primitive could not extend the managed region.
    #[error("heap growth failed: requested {requested} more bytes")]
    HeapExhausted {
        /// Bytes that were requested from the grow primitive.
        requested: usize,
    },

    /// The requested size does not fit in `usize` after alignment and the
    /// minimum-payload clamp are applied.
    #[error("requested allocation size overflows usize")]
    SizeOverflow,
}

/// Convenience alias matching the grounding repo's `MemoryResult`-style alias.
pub type AllocResult<T> = Result<T, AllocError>;
