//! # Cache Expiration
//!
//! Bounded-cache policy applied to runtime generations: entry-count caps
//! evicting oldest-inserted first, age-based purging, and whole-generation
//! purge when the store reports a quota failure.

use std::time::Duration;

use tracing::{debug, warn};

use crate::store::{CacheStore, EntryStamp, StoreResult, now_epoch_secs};

/// Expiration bounds for one cache generation
#[derive(Debug, Clone)]
pub struct ExpirationPolicy {
    /// Keep at most this many entries; overflow evicts oldest-inserted first
    pub max_entries: Option<usize>,
    /// Drop entries older than this
    pub max_age: Option<Duration>,
    /// Purge the whole generation when a write hits the storage quota
    pub purge_on_quota: bool,
}

impl ExpirationPolicy {
    /// No bounds at all
    pub fn unbounded() -> Self {
        Self {
            max_entries: None,
            max_age: None,
            purge_on_quota: false,
        }
    }

    /// The image-cache defaults: 50 entries, 30 days, purge on quota
    pub fn images_default() -> Self {
        Self {
            max_entries: Some(50),
            max_age: Some(Duration::from_secs(30 * 24 * 60 * 60)),
            purge_on_quota: true,
        }
    }

    /// Keys that violate the policy given `entries` in oldest-first
    /// insertion order, evaluated at `now` (seconds since the Unix epoch).
    /// Age violations come first, then count overflow from the oldest end.
    pub fn violations(&self, entries: &[EntryStamp], now: u64) -> Vec<String> {
        let mut doomed: Vec<String> = Vec::new();

        if let Some(max_age) = self.max_age {
            let cutoff = now.saturating_sub(max_age.as_secs());
            for entry in entries {
                if entry.stored_at < cutoff {
                    doomed.push(entry.key.clone());
                }
            }
        }

        if let Some(max_entries) = self.max_entries {
            let remaining: Vec<&EntryStamp> = entries
                .iter()
                .filter(|e| !doomed.contains(&e.key))
                .collect();
            if remaining.len() > max_entries {
                let overflow = remaining.len() - max_entries;
                for entry in remaining.into_iter().take(overflow) {
                    doomed.push(entry.key.clone());
                }
            }
        }

        doomed
    }

    /// Delete every violating entry in `generation`; returns how many went
    pub async fn sweep(&self, store: &dyn CacheStore, generation: &str) -> StoreResult<usize> {
        let entries = store.entries(generation).await?;
        let doomed = self.violations(&entries, now_epoch_secs());
        for key in &doomed {
            store.delete(generation, key).await?;
            debug!(generation, key, "evicted expired cache entry");
        }
        if !doomed.is_empty() {
            warn!(
                generation,
                evicted = doomed.len(),
                "expiration policy evicted entries"
            );
        }
        Ok(doomed.len())
    }

    /// Quota recovery: drop the whole generation so the triggering write can
    /// be re-attempted by the caller
    pub async fn purge(&self, store: &dyn CacheStore, generation: &str) -> StoreResult<()> {
        warn!(generation, "storage quota exceeded, purging generation");
        store.delete_generation(generation).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StoredResponse;
    use crate::store::MemoryStore;
    use bytes::Bytes;

    fn stamp(key: &str, stored_at: u64, size: u64) -> EntryStamp {
        EntryStamp {
            key: key.to_string(),
            stored_at,
            size,
        }
    }

    #[test]
    fn test_no_violations_within_bounds() {
        let policy = ExpirationPolicy {
            max_entries: Some(3),
            max_age: Some(Duration::from_secs(100)),
            purge_on_quota: false,
        };
        let entries = vec![stamp("a", 950, 1), stamp("b", 990, 1)];
        assert!(policy.violations(&entries, 1000).is_empty());
    }

    #[test]
    fn test_age_violation() {
        let policy = ExpirationPolicy {
            max_entries: None,
            max_age: Some(Duration::from_secs(100)),
            purge_on_quota: false,
        };
        let entries = vec![stamp("old", 800, 1), stamp("fresh", 950, 1)];
        assert_eq!(policy.violations(&entries, 1000), vec!["old"]);
    }

    #[test]
    fn test_count_overflow_evicts_oldest_first() {
        let policy = ExpirationPolicy {
            max_entries: Some(2),
            max_age: None,
            purge_on_quota: false,
        };
        let entries = vec![stamp("a", 1, 1), stamp("b", 2, 1), stamp("c", 3, 1), stamp("d", 4, 1)];
        assert_eq!(policy.violations(&entries, 1000), vec!["a", "b"]);
    }

    #[test]
    fn test_age_purge_counts_toward_overflow() {
        let policy = ExpirationPolicy {
            max_entries: Some(2),
            max_age: Some(Duration::from_secs(100)),
            purge_on_quota: false,
        };
        // "a" ages out, which already brings the count down to the cap.
        let entries = vec![stamp("a", 100, 1), stamp("b", 950, 1), stamp("c", 990, 1)];
        assert_eq!(policy.violations(&entries, 1000), vec!["a"]);
    }

    #[tokio::test]
    async fn test_sweep_enforces_entry_cap() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .put("images", &format!("img-{i}"), StoredResponse::ok_with_body(Bytes::from_static(b"x")))
                .await
                .unwrap();
        }

        let policy = ExpirationPolicy {
            max_entries: Some(3),
            max_age: None,
            purge_on_quota: false,
        };
        let evicted = policy.sweep(&store, "images").await.unwrap();
        assert_eq!(evicted, 2);

        let keys: Vec<String> = store
            .entries("images")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["img-2", "img-3", "img-4"]);
    }

    #[tokio::test]
    async fn test_purge_drops_generation() {
        let store = MemoryStore::new();
        store
            .put("images", "a", StoredResponse::ok_with_body(Bytes::from_static(b"x")))
            .await
            .unwrap();

        let policy = ExpirationPolicy::images_default();
        policy.purge(&store, "images").await.unwrap();
        assert!(store.entries("images").await.unwrap().is_empty());
    }
}
