//! A single key-value entry behind a reader/writer lock.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One bucket-chain entry.
///
/// `key` is immutable for the item's lifetime (set once at creation, never
/// rewritten by `SET`), so it needs no lock. `value` is the only mutable
/// field and is guarded by its own `RwLock`, independent of whichever bucket
/// mutex currently protects the chain this item lives in — see
/// [`crate::table::HashTable`] for the locking order this depends on.
pub struct Item {
    key: Box<[u8]>,
    value: RwLock<Option<Box<[u8]>>>,
}

impl Item {
    /// Creates an item for `key` with no value set.
    #[must_use]
    pub fn new(key: Box<[u8]>) -> Self {
        Self { key, value: RwLock::new(None) }
    }

    /// The item's key.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Takes the value lock in read mode. Callers that must hold this lock
    /// before releasing a bucket mutex (see `HashTable::get`) take the guard
    /// directly rather than going through [`Item::read_value`].
    pub fn read(&self) -> RwLockReadGuard<'_, Option<Box<[u8]>>> {
        self.value.read()
    }

    /// Takes the value lock in write mode, for callers that must hold it
    /// across a structural change to the bucket chain (see
    /// `HashTable::del`).
    pub fn write(&self) -> RwLockWriteGuard<'_, Option<Box<[u8]>>> {
        self.value.write()
    }

    /// Copies out the current value, if any, under a read lock.
    #[must_use]
    pub fn read_value(&self) -> Option<Box<[u8]>> {
        self.read().clone()
    }

    /// Replaces the value under a write lock, returning the old one so the
    /// caller can drop it outside of any bucket lock it may also be holding.
    pub fn swap_value(&self, new_value: Option<Box<[u8]>>) -> Option<Box<[u8]>> {
        std::mem::replace(&mut self.write(), new_value)
    }
}
