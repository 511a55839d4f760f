//! Tunables for [`crate::table::HashTable`] and its worker pool.

/// Construction-time parameters for a [`crate::table::HashTable`].
///
/// Grounded in the excerpt's compile-time constants (`HT_CAPACITY`,
/// `THREAD_POOL_SIZE`, `MAX_QUEUE_SIZE`), turned into runtime configuration
/// so a deployment can size the store without a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of buckets in the hash table. The excerpt hardcodes 256.
    pub bucket_count: usize,
    /// Number of worker threads draining the work queue.
    pub thread_pool_size: usize,
    /// Maximum number of connections the work queue will hold before
    /// `submit` blocks (or fails, depending on the caller's choice).
    pub max_queue_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_count: 256,
            thread_pool_size: 8,
            max_queue_size: 64,
        }
    }
}
