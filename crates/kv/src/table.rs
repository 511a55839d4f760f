//! The bucketed hash table: per-bucket mutexes guarding `Vec<Arc<Item>>`
//! chains, per-item reader/writer locks guarding values.
//!
//! Lock order is always bucket mutex, then item rwlock — never the reverse —
//! and `GET` drops the bucket mutex before copying the value out, exactly as
//! `get_request` in the excerpt takes the item's reader lock before
//! unlocking the bucket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{KvError, KvResult};
use crate::hash::bucket_index;
use crate::item::Item;

/// A process-wide snapshot: requests served and time since the table was
/// created, the two counters spec.md calls for ("a process-wide atomic
/// counter... and a monotonic start timestamp").
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub request_count: u64,
    pub uptime: std::time::Duration,
}

/// An in-memory, concurrency-safe key-value table.
///
/// The excerpt represents each bucket as an intrusive doubly-linked list
/// (`hash_item_t::next`/`prev`) so `DEL` can unlink in O(1) without
/// rescanning. Safe Rust has no sound way to hold borrowed "previous" links
/// across a mutex release; a `Mutex<Vec<Arc<Item>>>` per bucket gives the
/// same externally observable behavior (O(bucket length) chain walk, O(1)
/// amortized unlink via `swap_remove`) without unsafe aliasing.
pub struct HashTable {
    buckets: Vec<Mutex<Vec<Arc<Item>>>>,
    request_count: AtomicU64,
    start_time: Instant,
}

impl HashTable {
    /// Builds a table with `config.bucket_count` empty buckets.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut buckets = Vec::with_capacity(config.bucket_count);
        buckets.resize_with(config.bucket_count, || Mutex::new(Vec::new()));
        Self {
            buckets,
            request_count: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Number of requests served since construction.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Wall-clock uptime since construction.
    #[must_use]
    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// A point-in-time snapshot of the request counter and uptime.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        Metrics { request_count: self.request_count(), uptime: self.uptime() }
    }

    fn bucket_for(&self, key: &[u8]) -> &Mutex<Vec<Arc<Item>>> {
        &self.buckets[bucket_index(key, self.buckets.len())]
    }

    /// Looks up `key`, copies out its current value under a read lock.
    ///
    /// Mirrors `get_request`: find the item under the bucket mutex, take the
    /// item's read lock *while the bucket mutex is still held*, then release
    /// the bucket mutex before copying the value and dropping the read lock.
    /// Taking the read lock before releasing the bucket mutex is what stops
    /// a concurrent `del` (which needs the bucket mutex to unlink) from
    /// racing a `get` that already found the item but hasn't locked it yet.
    pub fn get(&self, key: &[u8]) -> KvResult<Box<[u8]>> {
        let bucket = self.bucket_for(key).lock();
        let item = bucket
            .iter()
            .find(|item| item.key() == key)
            .cloned()
            .ok_or(KvError::KeyNotFound)?;
        let guard = item.read();
        drop(bucket);

        let value = guard.clone().ok_or(KvError::KeyNotFound)?;
        drop(guard);
        self.request_count.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    /// Inserts or overwrites `key`'s value.
    ///
    /// Mirrors `set_request`: find-or-create the item under the bucket
    /// mutex, then swap the value under the item's write lock *before*
    /// releasing the bucket mutex. Swapping while the bucket is still locked
    /// is what stops a concurrent `del` from unlinking the just-created item
    /// between its insertion and its first value write, which would
    /// otherwise let `set` report success for a value stored on an item no
    /// bucket can ever reach again.
    pub fn set(&self, key: &[u8], value: Box<[u8]>) {
        let mut bucket = self.bucket_for(key).lock();
        let item = match bucket.iter().find(|item| item.key() == key) {
            Some(item) => Arc::clone(item),
            None => {
                let item = Arc::new(Item::new(key.into()));
                bucket.push(Arc::clone(&item));
                item
            }
        };
        let _old = item.swap_value(Some(value));
        drop(bucket);

        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes `key`, dropping its item once no other reference remains.
    ///
    /// Mirrors `del_request`'s lock order exactly: take the item's write
    /// lock under the bucket mutex, unlink it, release the write lock, then
    /// release the bucket mutex.
    pub fn del(&self, key: &[u8]) -> KvResult<()> {
        let mut bucket = self.bucket_for(key).lock();
        let pos = bucket
            .iter()
            .position(|item| item.key() == key)
            .ok_or(KvError::KeyNotFound)?;
        let item = Arc::clone(&bucket[pos]);
        let guard = item.write();
        bucket.swap_remove(pos);
        drop(guard);
        drop(bucket);

        self.request_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
