//! Minimal, zero-config tracing setup shared by the `blockkv` crates.
//!
//! `blockkv-core` and `blockkv-alloc` never depend on `tracing` directly —
//! they go through the macros re-exported here, so the actual subscriber
//! wiring lives in exactly one place.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

pub use tracing::{debug, error, info, trace, warn};

static INIT: OnceLock<()> = OnceLock::new();

/// Errors from setting up the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A global subscriber was already installed by someone else.
    #[error("a tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Install a formatting subscriber reading `RUST_LOG` (defaulting to `info`).
///
/// Safe to call more than once from the same process; only the first call
/// actually installs a subscriber, later calls are no-ops.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

/// Install a subscriber for test binaries: always-on, line-numbered, and
/// tolerant of being called from many `#[test]` functions in parallel.
pub fn init_test() {
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    });
}
