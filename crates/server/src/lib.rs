//! Minimal TCP front end for `blockkv-core`: accepts connections, frames
//! requests with [`wire`], and dispatches them onto a shared `HashTable`
//! through a bounded work queue and worker pool.
//!
//! Kept as a library as well as a binary purely so the framing and
//! connection-handling logic can be exercised with real `TcpStream`s in
//! integration tests without spawning the whole CLI.

pub mod wire;

use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use blockkv_core::{del_request, get_request, set_request, Config, HashTable, Request, WorkQueue, WorkerPool};

use wire::{Op, TcpConnection};

/// Runs one connection to completion: read a request, dispatch it against
/// `table`, write the response, repeat until the client closes the
/// connection or a handler asks to close it.
pub fn handle_connection(stream: TcpStream, table: &HashTable) {
    let mut stream = stream;
    loop {
        let header = match wire::read_header(&mut stream) {
            Ok(header) => header,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return,
            Err(err) => {
                blockkv_log::debug!(%err, "closing connection after a framing error");
                return;
            }
        };

        let mut conn = TcpConnection { stream: &mut stream };
        let result = match header.op {
            Op::Get => get_request(table, &mut conn, &Request::keyed(header.key)).map(|()| false),
            Op::Del => del_request(table, &mut conn, &Request::keyed(header.key)).map(|()| false),
            Op::Set => {
                let mut request = Request { key: header.key, msg_len: header.payload_len as usize, connection_close: false };
                match set_request(table, &mut conn, &mut request) {
                    Ok(io_result) => io_result.map(|()| request.connection_close),
                    Err(err) => {
                        blockkv_log::debug!(%err, "SET failed");
                        return;
                    }
                }
            }
        };

        match result {
            Ok(true) | Err(_) => return,
            Ok(false) => {}
        }
    }
}

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_signum: i32) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Installs a `SIGINT` handler that flips the shutdown flag [`serve`] polls.
/// Unix-only: good enough for a single `Ctrl-C` demo, not a production
/// signal-handling story.
#[cfg(unix)]
pub fn install_sigint_handler() {
    // SAFETY: `on_sigint` only touches a `static AtomicBool`, which is
    // signal-safe, and is installed once before the accept loop starts.
    unsafe {
        libc::signal(libc::SIGINT, on_sigint as usize);
    }
}

#[cfg(not(unix))]
pub fn install_sigint_handler() {
    blockkv_log::warn!("Ctrl-C shutdown is only wired up on unix in this demo binary");
}

/// Binds `bind`, builds the table/queue/pool per `config`, and accepts
/// connections until the shutdown flag is set (see
/// [`install_sigint_handler`]), then drains the queue and joins every
/// worker before returning.
pub fn serve(bind: &str, config: Config) -> anyhow::Result<()> {
    let table = Arc::new(HashTable::new(config));
    let queue: Arc<WorkQueue<TcpStream>> = Arc::new(WorkQueue::new(config.max_queue_size));

    let pool = {
        let table = Arc::clone(&table);
        WorkerPool::spawn(Arc::clone(&queue), config.thread_pool_size, move |stream| {
            handle_connection(stream, &table);
        })
    };

    let listener = TcpListener::bind(bind).with_context(|| format!("binding {bind}"))?;
    listener.set_nonblocking(true).context("setting listener non-blocking")?;
    blockkv_log::info!(%bind, threads = config.thread_pool_size, "blockkv-server listening");

    while !SHUTDOWN.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                blockkv_log::debug!(%peer, "accepted connection");
                if queue.try_push(stream).is_err() {
                    blockkv_log::warn!("work queue full, dropping connection");
                }
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(err) => return Err(err).context("accepting connection"),
        }
    }

    blockkv_log::info!("shutdown signal received, draining queue");
    queue.shutdown();
    pool.join();
    Ok(())
}
