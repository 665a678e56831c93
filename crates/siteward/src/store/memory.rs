//! # In-Memory Store
//!
//! This module provides the in-memory cache store implementation backing
//! tests and single-process deployments. Generations are plain locked maps;
//! eviction is owned by the expiration policy, not the store, so the store
//! only has to report entries in insertion order.

use std::collections::{BTreeMap, HashMap, VecDeque};

use parking_lot::RwLock;
use tracing::debug;

use crate::http::StoredResponse;
use crate::store::provider::{CacheStore, EntryStamp, StoreResult};
use crate::store::{StoreError, now_epoch_secs};

struct StoredEntry {
    response: StoredResponse,
    stored_at: u64,
}

#[derive(Default)]
struct Generation {
    entries: HashMap<String, StoredEntry>,
    // Insertion order, oldest key at the front. A re-put moves the key to
    // the back.
    order: VecDeque<String>,
}

impl Generation {
    fn bytes(&self) -> u64 {
        self.entries.values().map(|e| e.response.len()).sum()
    }
}

/// In-memory cache store with an optional byte quota across all generations
pub struct MemoryStore {
    generations: RwLock<BTreeMap<String, Generation>>,
    quota_bytes: Option<u64>,
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self {
            generations: RwLock::new(BTreeMap::new()),
            quota_bytes: None,
        }
    }

    /// Create a store that rejects writes once `quota_bytes` of body data is
    /// held, surfacing [`StoreError::QuotaExceeded`] like a full browser
    /// storage partition would
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            generations: RwLock::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_bytes(generations: &BTreeMap<String, Generation>) -> u64 {
        generations.values().map(Generation::bytes).sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, generation: &str, key: &str) -> StoreResult<Option<StoredResponse>> {
        let generations = self.generations.read();
        Ok(generations
            .get(generation)
            .and_then(|g| g.entries.get(key))
            .map(|e| e.response.clone()))
    }

    async fn put(&self, generation: &str, key: &str, response: StoredResponse) -> StoreResult<()> {
        let mut generations = self.generations.write();

        if let Some(quota) = self.quota_bytes {
            let displaced = generations
                .get(generation)
                .and_then(|g| g.entries.get(key))
                .map(|e| e.response.len())
                .unwrap_or(0);
            let used = Self::used_bytes(&generations) - displaced;
            let requested = response.len();
            if used + requested > quota {
                return Err(StoreError::QuotaExceeded {
                    requested,
                    available: quota.saturating_sub(used),
                });
            }
        }

        let slot = generations.entry(generation.to_string()).or_default();
        if slot.entries.contains_key(key) {
            slot.order.retain(|k| k != key);
        }
        slot.order.push_back(key.to_string());
        slot.entries.insert(
            key.to_string(),
            StoredEntry {
                response,
                stored_at: now_epoch_secs(),
            },
        );
        Ok(())
    }

    async fn delete(&self, generation: &str, key: &str) -> StoreResult<bool> {
        let mut generations = self.generations.write();
        let Some(slot) = generations.get_mut(generation) else {
            return Ok(false);
        };
        let existed = slot.entries.remove(key).is_some();
        if existed {
            slot.order.retain(|k| k != key);
            debug!(generation, key, "removed entry from memory store");
        }
        Ok(existed)
    }

    async fn entries(&self, generation: &str) -> StoreResult<Vec<EntryStamp>> {
        let generations = self.generations.read();
        let Some(slot) = generations.get(generation) else {
            return Ok(Vec::new());
        };
        Ok(slot
            .order
            .iter()
            .filter_map(|key| {
                slot.entries.get(key).map(|entry| EntryStamp {
                    key: key.clone(),
                    stored_at: entry.stored_at,
                    size: entry.response.len(),
                })
            })
            .collect())
    }

    async fn generations(&self) -> StoreResult<Vec<String>> {
        Ok(self.generations.read().keys().cloned().collect())
    }

    async fn delete_generation(&self, name: &str) -> StoreResult<bool> {
        let existed = self.generations.write().remove(name).is_some();
        if existed {
            debug!(generation = name, "deleted cache generation");
        }
        Ok(existed)
    }

    async fn match_any(&self, key: &str) -> StoreResult<Option<StoredResponse>> {
        let generations = self.generations.read();
        for slot in generations.values() {
            if let Some(entry) = slot.entries.get(key) {
                return Ok(Some(entry.response.clone()));
            }
        }
        Ok(None)
    }
}
