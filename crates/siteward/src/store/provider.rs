//! # Store Interface
//!
//! This module defines the storage trait that all cache store
//! implementations must follow.

use async_trait::async_trait;

use crate::http::StoredResponse;
use crate::store::StoreError;

/// Result of a store operation
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Insertion stamp for one cached entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStamp {
    /// Storage key of the entry
    pub key: String,
    /// When the entry was written, seconds since the Unix epoch
    pub stored_at: u64,
    /// Body size in bytes
    pub size: u64,
}

/// A named-generation cache store.
///
/// Individual operations are atomic; sequences are not. Two concurrent
/// handlers racing a get-then-put on the same key resolve last-writer-wins,
/// which the policy accepts for cache population.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get an entry from a generation
    async fn get(&self, generation: &str, key: &str) -> StoreResult<Option<StoredResponse>>;

    /// Put an entry into a generation, creating the generation if needed.
    /// Overwrites any existing entry under the same key.
    async fn put(&self, generation: &str, key: &str, response: StoredResponse) -> StoreResult<()>;

    /// Remove an entry; returns whether it existed
    async fn delete(&self, generation: &str, key: &str) -> StoreResult<bool>;

    /// Entry stamps for a generation, oldest insertion first
    async fn entries(&self, generation: &str) -> StoreResult<Vec<EntryStamp>>;

    /// Names of all generations currently present
    async fn generations(&self) -> StoreResult<Vec<String>>;

    /// Drop an entire generation; returns whether it existed
    async fn delete_generation(&self, name: &str) -> StoreResult<bool>;

    /// Look the key up across every generation, name order
    async fn match_any(&self, key: &str) -> StoreResult<Option<StoredResponse>>;
}
