//! # Cache Storage
//!
//! The engine never touches storage directly: every component takes the
//! [`CacheStore`] trait as an injected dependency. A store holds named cache
//! generations, each an isolated key-value map of URL to stored response.

// Module declarations
mod memory;
mod provider;

// Re-export primary types from our various modules
pub use memory::MemoryStore;
pub use provider::{CacheStore, EntryStamp, StoreResult};

/// Errors surfaced by cache store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage quota exceeded: {requested} bytes requested, {available} available")]
    QuotaExceeded { requested: u64, available: u64 },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Seconds since the Unix epoch, used for entry stamps
pub(crate) fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
