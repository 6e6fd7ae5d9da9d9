//! Per-key metadata index shared by all cache tiers.
//!
//! One metadata record exists per key, across the whole store: a record is
//! present if and only if the owning tier map holds the key. The index
//! drives TTL expiry (one shared predicate for both the lazy read path and
//! the background sweep), tag invalidation, and LRU eviction ranking.
//!
//! Access stats (`last_accessed`, `hit_count`) are diagnostics and eviction
//! hints only; they may be stale without violating any invariant.

use crate::cache::types::{EntryPriority, Tier};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Bookkeeping record for one cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Tier whose map owns the value.
    pub tier: Tier,
    /// Wall-clock creation time. Overwritten on repeated `set`.
    pub created_at: DateTime<Utc>,
    /// Wall-clock expiry; `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Entry priority (informational).
    pub priority: EntryPriority,
    /// Labels for bulk invalidation.
    pub tags: Vec<String>,
    /// Approximate serialized size in bytes.
    pub approx_size: u64,

    /// Last access, for LRU ranking. Not persisted; rehydrated entries
    /// fall back to file mtime.
    #[serde(skip, default = "Instant::now")]
    pub last_accessed: Instant,
    /// Number of hits served. Not persisted.
    #[serde(skip)]
    pub hit_count: u64,
}

impl EntryMetadata {
    /// Create metadata for a fresh entry.
    pub fn new(
        tier: Tier,
        ttl: Option<Duration>,
        priority: EntryPriority,
        tags: Vec<String>,
        approx_size: u64,
    ) -> Self {
        let now = Utc::now();
        let expires_at = ttl
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .map(|d| now + d);

        Self {
            tier,
            created_at: now,
            expires_at,
            priority,
            tags,
            approx_size,
            last_accessed: Instant::now(),
            hit_count: 0,
        }
    }

    /// The single expiry predicate shared by lazy reads and the sweep.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }

    /// Whether any of the given tags matches this entry's tags.
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter()
            .any(|t| self.tags.iter().any(|own| own == t.as_ref()))
    }
}

/// Thread-safe metadata index over all tiers.
///
/// Uses `DashMap` for concurrent access and atomics for per-tier
/// occupancy so diagnostics never need a full scan.
pub struct MetadataStore {
    entries: DashMap<String, EntryMetadata>,
    tier_counts: [AtomicU64; 3],
    tier_bytes: [AtomicU64; 3],
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            tier_counts: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            tier_bytes: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    /// Insert or replace the record for `key`.
    ///
    /// Returns the previous record if one existed.
    pub fn insert(&self, key: &str, metadata: EntryMetadata) -> Option<EntryMetadata> {
        let tier = metadata.tier;
        let size = metadata.approx_size;
        let old = self.entries.insert(key.to_string(), metadata);

        if let Some(ref old_meta) = old {
            self.tier_counts[old_meta.tier.index()].fetch_sub(1, Ordering::Relaxed);
            self.tier_bytes[old_meta.tier.index()].fetch_sub(old_meta.approx_size, Ordering::Relaxed);
        }
        self.tier_counts[tier.index()].fetch_add(1, Ordering::Relaxed);
        self.tier_bytes[tier.index()].fetch_add(size, Ordering::Relaxed);

        old
    }

    /// Clone of the record for `key`, if any.
    pub fn get(&self, key: &str) -> Option<EntryMetadata> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Update access stats for a hit.
    ///
    /// Does nothing if the key is unknown.
    pub fn touch(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.last_accessed = Instant::now();
            entry.hit_count += 1;
        }
    }

    /// Remove the record for `key`.
    pub fn remove(&self, key: &str) -> Option<EntryMetadata> {
        if let Some((_, metadata)) = self.entries.remove(key) {
            self.tier_counts[metadata.tier.index()].fetch_sub(1, Ordering::Relaxed);
            self.tier_bytes[metadata.tier.index()].fetch_sub(metadata.approx_size, Ordering::Relaxed);
            Some(metadata)
        } else {
            None
        }
    }

    /// Whether a record exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries tracked in the given tier.
    pub fn count_in_tier(&self, tier: Tier) -> u64 {
        self.tier_counts[tier.index()].load(Ordering::Relaxed)
    }

    /// Approximate byte total for the given tier.
    pub fn bytes_in_tier(&self, tier: Tier) -> u64 {
        self.tier_bytes[tier.index()].load(Ordering::Relaxed)
    }

    /// Total entries tracked across all tiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the least-recently-accessed entry in a tier.
    ///
    /// O(tier size) scan; ties are broken arbitrarily. Returns `None` for
    /// an empty tier.
    pub fn lru_candidate(&self, tier: Tier) -> Option<String> {
        self.entries
            .iter()
            .filter(|e| e.value().tier == tier)
            .min_by_key(|e| e.value().last_accessed)
            .map(|e| e.key().clone())
    }

    /// Keys of all entries expired as of `now`, with their tiers.
    pub fn expired_keys(&self, now: DateTime<Utc>) -> Vec<(String, Tier)> {
        self.entries
            .iter()
            .filter(|e| e.value().is_expired(now))
            .map(|e| (e.key().clone(), e.value().tier))
            .collect()
    }

    /// Keys of all entries carrying at least one of the given tags.
    pub fn keys_with_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> Vec<(String, Tier)> {
        self.entries
            .iter()
            .filter(|e| e.value().has_any_tag(tags))
            .map(|e| (e.key().clone(), e.value().tier))
            .collect()
    }

    /// Keys of all entries in the given tier.
    pub fn keys_in_tier(&self, tier: Tier) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.value().tier == tier)
            .map(|e| e.key().clone())
            .collect()
    }

    /// Remove every record; counters reset to zero.
    pub fn clear(&self) {
        self.entries.clear();
        for i in 0..3 {
            self.tier_counts[i].store(0, Ordering::Relaxed);
            self.tier_bytes[i].store(0, Ordering::Relaxed);
        }
    }
}
