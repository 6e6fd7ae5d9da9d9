//! Cache statistics tracking and reporting.
//!
//! Counters are diagnostics only: they may lag the store's actual contents
//! and are never consulted for correctness decisions.

use crate::cache::types::Tier;
use std::time::Instant;

/// Hit/miss/eviction counters for a single tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl TierCounters {
    /// Hit rate for this tier (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache statistics for monitoring and debugging.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub memory: TierCounters,
    pub session: TierCounters,
    pub persistent: TierCounters,

    /// Failed writes to the durable namespace (logged, never surfaced).
    pub persist_write_failures: u64,

    pub created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            memory: TierCounters::default(),
            session: TierCounters::default(),
            persistent: TierCounters::default(),
            persist_write_failures: 0,
            created_at: Instant::now(),
        }
    }

    /// Counters for the given tier.
    pub fn tier(&self, tier: Tier) -> &TierCounters {
        match tier {
            Tier::Memory => &self.memory,
            Tier::Session => &self.session,
            Tier::Persistent => &self.persistent,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut TierCounters {
        match tier {
            Tier::Memory => &mut self.memory,
            Tier::Session => &mut self.session,
            Tier::Persistent => &mut self.persistent,
        }
    }

    /// Record a cache hit.
    pub fn record_hit(&mut self, tier: Tier) {
        self.tier_mut(tier).hits += 1;
    }

    /// Record a cache miss.
    pub fn record_miss(&mut self, tier: Tier) {
        self.tier_mut(tier).misses += 1;
    }

    /// Record an LRU eviction.
    pub fn record_eviction(&mut self, tier: Tier) {
        self.tier_mut(tier).evictions += 1;
    }

    /// Record a TTL expiration (lazy or swept).
    pub fn record_expiration(&mut self, tier: Tier) {
        self.tier_mut(tier).expirations += 1;
    }

    /// Record a failed write to the durable namespace.
    pub fn record_persist_write_failure(&mut self) {
        self.persist_write_failures += 1;
    }

    /// Overall hit rate across all tiers (0.0 to 1.0).
    pub fn overall_hit_rate(&self) -> f64 {
        let hits = self.memory.hits + self.session.hits + self.persistent.hits;
        let misses = self.memory.misses + self.session.misses + self.persistent.misses;
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Time since statistics started.
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Current occupancy of one tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierUsage {
    /// Live entry count.
    pub entries: u64,
    /// Approximate serialized size of all entries.
    pub approx_bytes: u64,
}

/// Point-in-time statistics snapshot: counters plus occupancy.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub stats: CacheStats,
    pub memory_usage: TierUsage,
    pub session_usage: TierUsage,
    pub persistent_usage: TierUsage,
}

impl CacheStatistics {
    /// Occupancy for the given tier.
    pub fn usage(&self, tier: Tier) -> &TierUsage {
        match tier {
            Tier::Memory => &self.memory_usage,
            Tier::Session => &self.session_usage,
            Tier::Persistent => &self.persistent_usage,
        }
    }

    /// Total live entries across all tiers.
    pub fn total_entries(&self) -> u64 {
        self.memory_usage.entries + self.session_usage.entries + self.persistent_usage.entries
    }
}
