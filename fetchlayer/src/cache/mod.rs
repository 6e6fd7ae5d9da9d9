//! Tiered cache with TTL expiry, tag invalidation and LRU eviction.
//!
//! Three independent tiers (memory, session, persistent) share one metadata
//! index. The persistent tier mirrors to an on-disk namespace that is
//! rehydrated at startup; a background sweeper reclaims expired entries.

mod config;
mod metadata;
mod persistent;
mod stats;
mod store;
mod sweeper;
mod types;

pub use config::{
    format_size, CacheConfig, TierConfig, DEFAULT_MEMORY_ENTRIES, DEFAULT_PERSISTENT_ENTRIES,
    DEFAULT_SESSION_ENTRIES, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL,
};
pub use metadata::{EntryMetadata, MetadataStore};
pub use persistent::{
    clear_namespace, key_to_filename, namespace_stats, sweep_namespace, LoadStats, LoadedEntry,
    NamespaceReport, NamespaceStats, PersistEnvelope, PersistentStore, FILE_PREFIX, FILE_SUFFIX,
};
pub use stats::{CacheStatistics, CacheStats, TierCounters, TierUsage};
pub use store::{GetOptions, SetOptions, TieredCache};
pub use sweeper::{SweepOutcome, SweeperDaemon};
pub use types::{CacheError, EntryPriority, Tier, Ttl};
