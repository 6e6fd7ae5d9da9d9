//! Core types for the tiered cache.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Cache tier identifying where an entry lives.
///
/// Tiers are independent scopes with separate capacity: the same key string
/// stored in two tiers refers to two unrelated entries. In practice keys are
/// unique across the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Fast in-process tier, first choice for query results.
    Memory,
    /// Session-scoped tier, cleared when the session ends.
    Session,
    /// Durable tier mirrored to the on-disk namespace.
    Persistent,
}

impl Tier {
    /// All tiers, in declaration order.
    pub const ALL: [Tier; 3] = [Tier::Memory, Tier::Session, Tier::Persistent];

    /// Stable index for per-tier bookkeeping arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            Tier::Memory => 0,
            Tier::Session => 1,
            Tier::Persistent => 2,
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Memory
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Memory => write!(f, "memory"),
            Tier::Session => write!(f, "session"),
            Tier::Persistent => write!(f, "persistent"),
        }
    }
}

/// Relative importance of a cache entry.
///
/// Recorded in metadata and surfaced in diagnostics; not consulted by the
/// eviction policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Time-to-live policy for a cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ttl {
    /// Use the store's configured default TTL.
    #[default]
    Default,
    /// Never expires.
    None,
    /// Expires this long after insertion.
    After(Duration),
}

/// Cache-related errors.
///
/// These only arise on the persistence paths; the in-memory tiers do not
/// fail. The store logs and swallows them so the in-memory tiers stay
/// authoritative even when the durable namespace is unusable.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error from the persistent namespace
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope (de)serialization failure
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid cache configuration
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}
