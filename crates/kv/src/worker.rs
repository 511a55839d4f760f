//! A fixed-size pool of OS threads draining a [`WorkQueue`].

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::queue::WorkQueue;

/// Spawns `thread_pool_size` threads, each looping on `queue.pop()` and
/// handing the popped item to `handle`, until the queue shuts down.
///
/// Mirrors `init_hashtable`'s `pthread_create` loop over `worker_thread`;
/// `std::thread` rather than an async runtime, since each worker's loop body
/// is a blocking `pop` followed by synchronous bucket/item lock work, not
/// I/O-bound enough to benefit from cooperative scheduling.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts the pool. `handle` is cloned (as an `Arc`) into every worker
    /// thread and invoked once per dequeued item.
    pub fn spawn<T, F>(queue: Arc<WorkQueue<T>>, thread_pool_size: usize, handle: F) -> Self
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let handle = Arc::new(handle);
        let mut handles = Vec::with_capacity(thread_pool_size);
        for worker_id in 0..thread_pool_size {
            let queue = Arc::clone(&queue);
            let handle = Arc::clone(&handle);
            handles.push(
                std::thread::Builder::new()
                    .name(format!("blockkv-worker-{worker_id}"))
                    .spawn(move || {
                        while let Some(item) = queue.pop() {
                            handle(item);
                        }
                        blockkv_log::debug!(worker_id, "worker shut down");
                    })
                    .expect("failed to spawn worker thread"),
            );
        }
        blockkv_log::info!(thread_pool_size, "worker pool started");
        Self { handles }
    }

    /// Blocks until every worker thread has exited. Call `queue.shutdown()`
    /// first or this never returns.
    pub fn join(self) {
        let worker_count = self.handles.len();
        for handle in self.handles {
            let _ = handle.join();
        }
        blockkv_log::info!(worker_count, "worker pool shut down");
    }
}
