//! Error types for the key-value store core.

use thiserror::Error;

/// Failure modes surfaced by [`crate::table::HashTable`] and request handlers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KvError {
    /// `GET` or `DEL` against a key with no live item.
    #[error("key not found")]
    KeyNotFound,

    /// The bounded work queue has no free slot and the submitter asked not
    /// to block for one.
    #[error("work queue is full")]
    QueueFull,

    /// The work queue (or one of its internal locks) was poisoned by a
    /// panicking worker.
    #[error("store is shutting down or a worker panicked")]
    StoreError,

    /// A malformed request reached a handler (wrong opcode, truncated frame).
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Convenience alias for fallible store operations.
pub type KvResult<T> = Result<T, KvError>;
