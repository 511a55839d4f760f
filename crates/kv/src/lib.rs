//! An in-memory key-value store core: a bucketed hash table with
//! per-bucket and per-item locking, plus a bounded work queue and worker
//! pool for dispatching requests onto it.
//!
//! Ported from a C excerpt (`kvstore.c`: `init_hashtable`, `worker_thread`,
//! `get_request`/`set_request`/`del_request`) with the wire protocol and
//! socket I/O pulled out behind [`handlers::ConnectionHandle`] so this
//! crate has no knowledge of TCP framing — see the `blockkv-server` binary
//! for that.
//!
//! ```
//! use blockkv_core::{Config, HashTable};
//!
//! let table = HashTable::new(Config::default());
//! table.set(b"hello", b"world".to_vec().into_boxed_slice());
//! assert_eq!(&*table.get(b"hello").unwrap(), b"world");
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod hash;
pub mod item;
pub mod queue;
pub mod table;
pub mod worker;

pub use config::Config;
pub use error::{KvError, KvResult};
pub use handlers::{del_request, get_request, set_request, ConnectionHandle, Request, Status};
pub use item::Item;
pub use queue::WorkQueue;
pub use table::{HashTable, Metrics};
pub use worker::WorkerPool;
