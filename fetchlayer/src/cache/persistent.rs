//! Durable backing store for the persistent tier.
//!
//! Entries are mirrored to a namespace directory as one JSON file per key:
//! `cache_<encoded-key>.json`, holding a `{key, value, metadata}` envelope.
//! Writes are atomic (temp file + rename) and best-effort: the in-memory
//! tier maps remain authoritative, so every failure here is reported to the
//! caller for logging and otherwise ignored.
//!
//! On startup, [`PersistentStore::load`] scans the namespace, deletes
//! records that expired while the process was down, removes anything
//! unparseable, and hands the survivors back for rehydration. File mtime
//! seeds the rehydrated entry's LRU recency.

use crate::cache::metadata::EntryMetadata;
use crate::cache::types::CacheError;
use crate::time::system_time_to_instant;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Filename prefix for all records in a namespace.
pub const FILE_PREFIX: &str = "cache_";

/// Filename suffix for all records in a namespace.
pub const FILE_SUFFIX: &str = ".json";

/// Durable `{key, value, metadata}` record.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistEnvelope {
    pub key: String,
    pub value: Value,
    pub metadata: EntryMetadata,
}

/// An entry recovered from the namespace at startup.
#[derive(Debug)]
pub struct LoadedEntry {
    pub key: String,
    pub value: Value,
    pub metadata: EntryMetadata,
}

/// Outcome of a startup scan.
#[derive(Debug, Default)]
pub struct LoadStats {
    /// Entries rehydrated.
    pub loaded: u64,
    /// Records dropped because they expired while the process was down.
    pub expired: u64,
    /// Records dropped because they could not be parsed.
    pub unparseable: u64,
}

/// File-per-key store under a namespace directory.
pub struct PersistentStore {
    dir: PathBuf,
}

impl PersistentStore {
    /// Create a store over the given namespace directory.
    ///
    /// The directory is created lazily by [`ensure_dir`](Self::ensure_dir).
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Namespace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the namespace directory if it does not exist.
    pub async fn ensure_dir(&self) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(CacheError::Io)
    }

    /// Path of the record file for `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(key_to_filename(key))
    }

    /// Write the envelope for `key` atomically.
    ///
    /// The caller is expected to log the error and carry on; a failed
    /// write leaves the previous record (if any) intact.
    pub async fn write(
        &self,
        key: &str,
        value: &Value,
        metadata: &EntryMetadata,
    ) -> Result<(), CacheError> {
        let envelope = PersistEnvelope {
            key: key.to_string(),
            value: value.clone(),
            metadata: metadata.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        let path = self.record_path(key);
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &bytes).await?;
        tokio::fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    /// Remove the record for `key`.
    ///
    /// Returns whether a record existed.
    pub async fn remove(&self, key: &str) -> Result<bool, CacheError> {
        match tokio::fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Remove every record in the namespace.
    pub async fn clear(&self) -> Result<u64, CacheError> {
        let mut removed = 0u64;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await.map_err(CacheError::Io)? {
            if !is_record_filename(&entry.file_name().to_string_lossy()) {
                continue;
            }
            if tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Scan the namespace and return all live entries.
    ///
    /// Expired and unparseable records are deleted during the scan. File
    /// mtime becomes the rehydrated entry's `last_accessed` so pre-restart
    /// recency still ranks LRU eviction.
    pub async fn load(&self) -> Result<(Vec<LoadedEntry>, LoadStats), CacheError> {
        let mut loaded = Vec::new();
        let mut stats = LoadStats::default();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((loaded, stats));
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        let now = Utc::now();
        while let Some(entry) = entries.next_entry().await.map_err(CacheError::Io)? {
            let path = entry.path();
            if !is_record_filename(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let envelope = match read_envelope(&path).await {
                Some(envelope) => envelope,
                None => {
                    stats.unparseable += 1;
                    let _ = tokio::fs::remove_file(&path).await;
                    continue;
                }
            };

            if envelope.metadata.is_expired(now) {
                stats.expired += 1;
                let _ = tokio::fs::remove_file(&path).await;
                continue;
            }

            let mut metadata = envelope.metadata;
            metadata.last_accessed = entry
                .metadata()
                .await
                .ok()
                .and_then(|m| m.modified().ok())
                .and_then(system_time_to_instant)
                .unwrap_or_else(Instant::now);

            stats.loaded += 1;
            loaded.push(LoadedEntry {
                key: envelope.key,
                value: envelope.value,
                metadata,
            });
        }

        debug!(
            loaded = stats.loaded,
            expired = stats.expired,
            unparseable = stats.unparseable,
            dir = %self.dir.display(),
            "persistent namespace scanned"
        );
        Ok((loaded, stats))
    }
}

async fn read_envelope(path: &Path) -> Option<PersistEnvelope> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "removing unparseable cache record");
            None
        }
    }
}

/// Encode a cache key as a namespace filename.
///
/// Keys made of filesystem-safe characters map directly; anything else is
/// sanitized and suffixed with a hash of the original key so distinct keys
/// cannot collide. The true key lives inside the envelope, so the encoding
/// does not need to be reversible.
pub fn key_to_filename(key: &str) -> String {
    let safe = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'));

    if safe && !key.is_empty() && key.len() <= 120 {
        return format!("{FILE_PREFIX}{key}{FILE_SUFFIX}");
    }

    let sanitized: String = key
        .chars()
        .take(80)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    format!("{FILE_PREFIX}{sanitized}-{:016x}{FILE_SUFFIX}", hasher.finish())
}

fn is_record_filename(name: &str) -> bool {
    name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX)
}

// ---------------------------------------------------------------------------
// Namespace maintenance (used by the CLI; synchronous by design)
// ---------------------------------------------------------------------------

/// Point-in-time contents of a namespace directory.
#[derive(Debug, Default)]
pub struct NamespaceStats {
    /// Record files present.
    pub files: u64,
    /// Total size of record files in bytes.
    pub bytes: u64,
    /// Records whose metadata says they are already expired.
    pub expired: u64,
}

/// Result of removing records from a namespace.
#[derive(Debug, Default)]
pub struct NamespaceReport {
    /// Record files deleted.
    pub files_deleted: u64,
    /// Bytes freed by the deletions.
    pub bytes_freed: u64,
}

/// Inspect a namespace directory without touching it.
pub fn namespace_stats(dir: &Path) -> std::io::Result<NamespaceStats> {
    let mut stats = NamespaceStats::default();
    let now = Utc::now();

    for entry in read_namespace(dir)? {
        let (path, size) = entry;
        stats.files += 1;
        stats.bytes += size;

        let parsed = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<PersistEnvelope>(&bytes).ok());
        match parsed {
            Some(envelope) if envelope.metadata.is_expired(now) => stats.expired += 1,
            Some(_) => {}
            // Unparseable records count as expired: the next sweep drops them.
            None => stats.expired += 1,
        }
    }
    Ok(stats)
}

/// Delete expired (and unparseable) records from a namespace.
pub fn sweep_namespace(dir: &Path) -> std::io::Result<NamespaceReport> {
    let mut report = NamespaceReport::default();
    let now = Utc::now();

    for (path, size) in read_namespace(dir)? {
        let keep = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<PersistEnvelope>(&bytes).ok())
            .map(|envelope| !envelope.metadata.is_expired(now))
            .unwrap_or(false);

        if !keep && std::fs::remove_file(&path).is_ok() {
            report.files_deleted += 1;
            report.bytes_freed += size;
        }
    }
    Ok(report)
}

/// Delete every record from a namespace.
pub fn clear_namespace(dir: &Path) -> std::io::Result<NamespaceReport> {
    let mut report = NamespaceReport::default();

    for (path, size) in read_namespace(dir)? {
        if std::fs::remove_file(&path).is_ok() {
            report.files_deleted += 1;
            report.bytes_freed += size;
        }
    }
    Ok(report)
}

fn read_namespace(dir: &Path) -> std::io::Result<Vec<(PathBuf, u64)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !is_record_filename(&name.to_string_lossy()) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        records.push((entry.path(), size));
    }
    Ok(records)
}
