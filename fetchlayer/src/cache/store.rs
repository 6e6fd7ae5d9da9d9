//! Tiered cache store.
//!
//! Three independent key/value tiers (memory, session, persistent) share a
//! single metadata index. The persistent tier write-through mirrors to the
//! durable namespace; mirror failures are logged and swallowed so the
//! in-memory maps stay authoritative.
//!
//! The store is an explicitly constructed instance: consumers receive an
//! `Arc<TieredCache>` by injection, and tests build isolated stores freely.

use crate::cache::config::CacheConfig;
use crate::cache::metadata::{EntryMetadata, MetadataStore};
use crate::cache::persistent::{LoadStats, PersistentStore};
use crate::cache::stats::{CacheStatistics, CacheStats, TierUsage};
use crate::cache::sweeper::SweepOutcome;
use crate::cache::types::{EntryPriority, Tier, Ttl};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for [`TieredCache::get`].
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// Tier to look in.
    pub tier: Tier,
    /// Whether a hit refreshes LRU recency and the hit counter.
    pub update_access_time: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            tier: Tier::Memory,
            update_access_time: true,
        }
    }
}

impl GetOptions {
    /// Look in the given tier instead of memory.
    pub fn in_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Peek without refreshing access stats.
    pub fn skip_touch(mut self) -> Self {
        self.update_access_time = false;
        self
    }
}

/// Options for [`TieredCache::set`].
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Tier to store in.
    pub tier: Tier,
    /// Expiry policy; `Ttl::Default` resolves against the store config.
    pub ttl: Ttl,
    /// Entry priority (informational).
    pub priority: EntryPriority,
    /// Labels for bulk invalidation.
    pub tags: Vec<String>,
}

impl SetOptions {
    /// Store in the given tier instead of memory.
    pub fn in_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Set the expiry policy.
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the entry priority.
    pub fn with_priority(mut self, priority: EntryPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Attach invalidation tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

enum RemovalKind {
    Deleted,
    Expired,
    Evicted,
}

/// Three-tier cache with TTL expiry, tag invalidation and LRU eviction.
pub struct TieredCache {
    config: CacheConfig,
    values: [Mutex<HashMap<String, Value>>; 3],
    metadata: MetadataStore,
    stats: Mutex<CacheStats>,
    persistent: PersistentStore,
}

impl TieredCache {
    /// Create a store with the given configuration.
    ///
    /// The persistent namespace is not read here; call
    /// [`load_persistent`](Self::load_persistent) once at startup to
    /// rehydrate it.
    pub fn new(config: CacheConfig) -> Self {
        let persistent = PersistentStore::new(config.persist_dir.clone());
        Self {
            config,
            values: [
                Mutex::new(HashMap::new()),
                Mutex::new(HashMap::new()),
                Mutex::new(HashMap::new()),
            ],
            metadata: MetadataStore::new(),
            stats: Mutex::new(CacheStats::new()),
            persistent,
        }
    }

    /// Store configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Rehydrate the persistent tier from the durable namespace.
    ///
    /// Records that expired while the process was down are deleted during
    /// the scan. Never fails: an unusable namespace just leaves the
    /// persistent tier empty.
    pub async fn load_persistent(&self) -> LoadStats {
        if let Err(e) = self.persistent.ensure_dir().await {
            warn!(error = %e, "cannot create persistent cache directory");
            return LoadStats::default();
        }

        match self.persistent.load().await {
            Ok((entries, stats)) => {
                for entry in entries {
                    self.metadata.insert(&entry.key, entry.metadata);
                    self.values[Tier::Persistent.index()]
                        .lock()
                        .unwrap()
                        .insert(entry.key, entry.value);
                }
                if stats.loaded > 0 {
                    info!(loaded = stats.loaded, expired = stats.expired, "persistent cache rehydrated");
                }
                stats
            }
            Err(e) => {
                warn!(error = %e, "failed to load persistent cache");
                LoadStats::default()
            }
        }
    }

    /// Look up a value.
    ///
    /// Returns `None` on absence, tier mismatch, or expiry; an expired
    /// entry is deleted on the way out (lazy expiry). A hit refreshes
    /// access stats unless `update_access_time` is off.
    pub async fn get(&self, key: &str, options: GetOptions) -> Option<Value> {
        let tier = options.tier;

        let meta = match self.metadata.get(key) {
            Some(meta) if meta.tier == tier => meta,
            _ => {
                // A value with no metadata record is unreachable state;
                // drop it rather than serve it.
                let orphan = self.values[tier.index()].lock().unwrap().remove(key);
                if orphan.is_some() && !self.metadata.contains(key) {
                    debug!(key = %key, tier = %tier, "dropped orphaned cache value");
                }
                self.stats.lock().unwrap().record_miss(tier);
                return None;
            }
        };

        if meta.is_expired(Utc::now()) {
            self.remove_entry(key, tier, RemovalKind::Expired).await;
            self.stats.lock().unwrap().record_miss(tier);
            return None;
        }

        let value = self.values[tier.index()].lock().unwrap().get(key).cloned();
        match value {
            Some(value) => {
                if options.update_access_time {
                    self.metadata.touch(key);
                }
                self.stats.lock().unwrap().record_hit(tier);
                Some(value)
            }
            None => {
                // Metadata without a value: repair the index.
                self.remove_entry(key, tier, RemovalKind::Deleted).await;
                self.stats.lock().unwrap().record_miss(tier);
                None
            }
        }
    }

    /// Store a value, overwriting any existing entry for the key.
    ///
    /// Inserting a new key into a full tier first evicts that tier's
    /// least-recently-used entry.
    pub async fn set(&self, key: &str, value: Value, options: SetOptions) {
        let tier = options.tier;
        let ttl = self.resolve_ttl(options.ttl);
        let approx_size = serde_json::to_vec(&value).map(|b| b.len() as u64).unwrap_or(0);

        let occupies_tier = self
            .metadata
            .get(key)
            .map(|m| m.tier == tier)
            .unwrap_or(false);

        if !occupies_tier {
            let max = self.config.tier(tier).max_entries;
            if max > 0 && self.metadata.count_in_tier(tier) >= max as u64 {
                if let Some(victim) = self.metadata.lru_candidate(tier) {
                    debug!(key = %victim, tier = %tier, "evicting least recently used entry");
                    self.remove_entry(&victim, tier, RemovalKind::Evicted).await;
                }
            }
        }

        let metadata = EntryMetadata::new(tier, ttl, options.priority, options.tags, approx_size);
        if let Some(old) = self.metadata.insert(key, metadata.clone()) {
            // Keys are unique across the store: an overwrite that moves
            // tiers must release the value held by the previous tier.
            if old.tier != tier {
                self.values[old.tier.index()].lock().unwrap().remove(key);
                if old.tier == Tier::Persistent {
                    let _ = self.persistent.remove(key).await;
                }
            }
        }

        self.values[tier.index()]
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());

        if tier == Tier::Persistent {
            if let Err(e) = self.persistent.write(key, &value, &metadata).await {
                warn!(key = %key, error = %e, "failed to persist cache entry");
                self.stats.lock().unwrap().record_persist_write_failure();
            }
        }
    }

    /// Remove an entry from the given tier.
    ///
    /// Returns whether an entry existed there.
    pub async fn delete(&self, key: &str, tier: Tier) -> bool {
        match self.metadata.get(key) {
            Some(meta) if meta.tier == tier => {
                self.remove_entry(key, tier, RemovalKind::Deleted).await
            }
            _ => self.values[tier.index()].lock().unwrap().remove(key).is_some(),
        }
    }

    /// Remove every entry in one tier, or everything.
    pub async fn clear(&self, tier: Option<Tier>) {
        match tier {
            Some(tier) => {
                for key in self.metadata.keys_in_tier(tier) {
                    self.remove_entry(&key, tier, RemovalKind::Deleted).await;
                }
                self.values[tier.index()].lock().unwrap().clear();
            }
            None => {
                for t in Tier::ALL {
                    self.values[t.index()].lock().unwrap().clear();
                }
                self.metadata.clear();
                if let Err(e) = self.persistent.clear().await {
                    warn!(error = %e, "failed to clear persistent namespace");
                }
            }
        }
    }

    /// Delete every entry whose tags intersect the given set, across all
    /// tiers. Returns the number of entries removed.
    pub async fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let mut removed = 0;
        for (key, tier) in self.metadata.keys_with_any_tag(tags) {
            if self.remove_entry(&key, tier, RemovalKind::Deleted).await {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(count = removed, "invalidated cache entries by tag");
        }
        removed
    }

    /// Return the cached value, or run `factory`, store its result, and
    /// return it.
    ///
    /// Concurrent callers racing past the lookup may each run the factory;
    /// the last write wins, which is safe because `set` overwrites per key.
    pub async fn get_or_set<E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        options: SetOptions,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, E>>,
    {
        let lookup = GetOptions::default().in_tier(options.tier);
        if let Some(value) = self.get(key, lookup).await {
            return Ok(value);
        }

        let value = factory().await?;
        self.set(key, value.clone(), options).await;
        Ok(value)
    }

    /// Delete every expired entry.
    ///
    /// Shares the expiry predicate with the lazy read path, so the sweep
    /// and lazy expiry commute: whichever runs first removes the entry.
    pub async fn sweep(&self) -> SweepOutcome {
        let examined = self.metadata.len() as u64;
        let expired = self.metadata.expired_keys(Utc::now());

        let mut outcome = SweepOutcome {
            examined,
            expired: 0,
        };
        for (key, tier) in expired {
            self.remove_entry(&key, tier, RemovalKind::Expired).await;
            outcome.expired += 1;
        }
        outcome
    }

    /// Metadata record for a key, if any. Diagnostics only.
    pub fn entry_metadata(&self, key: &str) -> Option<EntryMetadata> {
        self.metadata.get(key)
    }

    /// Point-in-time statistics snapshot.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            stats: self.stats.lock().unwrap().clone(),
            memory_usage: self.usage(Tier::Memory),
            session_usage: self.usage(Tier::Session),
            persistent_usage: self.usage(Tier::Persistent),
        }
    }

    fn usage(&self, tier: Tier) -> TierUsage {
        TierUsage {
            entries: self.metadata.count_in_tier(tier),
            approx_bytes: self.metadata.bytes_in_tier(tier),
        }
    }

    fn resolve_ttl(&self, ttl: Ttl) -> Option<Duration> {
        match ttl {
            Ttl::Default => self.config.default_ttl,
            Ttl::None => None,
            Ttl::After(duration) => Some(duration),
        }
    }

    async fn remove_entry(&self, key: &str, tier: Tier, kind: RemovalKind) -> bool {
        let had_value = self.values[tier.index()].lock().unwrap().remove(key).is_some();
        let had_meta = self.metadata.remove(key).is_some();

        if tier == Tier::Persistent {
            if let Err(e) = self.persistent.remove(key).await {
                warn!(key = %key, error = %e, "failed to remove persisted cache entry");
            }
        }

        match kind {
            RemovalKind::Expired => self.stats.lock().unwrap().record_expiration(tier),
            RemovalKind::Evicted => self.stats.lock().unwrap().record_eviction(tier),
            RemovalKind::Deleted => {}
        }

        had_value || had_meta
    }
}
