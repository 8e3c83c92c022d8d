use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::LinkCardResult;
use crate::models::{LinkCardCache, LinkMetadata};

/// Shared link-card cache for one process.
///
/// Cheaply cloneable: all clones share the same in-memory maps and write
/// queue via `Arc`. Keeps one in-memory copy per cache path so documents
/// built in the same process don't re-read the file, and serializes writes
/// per path. Writes re-read the file and merge before writing, so entries
/// added by other processes in the meantime survive.
#[derive(Clone, Default)]
pub struct CacheManager {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    memory: RwLock<HashMap<PathBuf, LinkCardCache>>,
    /// Tail of the write queue for each path. `tokio::sync::Mutex` grants
    /// the lock in request order, so a save starts only after every earlier
    /// save for the same path has finished.
    write_queue: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    detached: StdMutex<Vec<JoinHandle<()>>>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cache for `path`, reading the file on first use.
    ///
    /// A missing file is an empty cache. An unreadable or unparseable file is
    /// logged and also treated as empty.
    pub async fn load(&self, path: &Path) -> LinkCardCache {
        if let Some(cache) = self.inner.memory.read().await.get(path) {
            return cache.clone();
        }

        let cache = read_cache_file(path).await;
        self.inner
            .memory
            .write()
            .await
            .entry(path.to_path_buf())
            .or_insert(cache)
            .clone()
    }

    /// Merge `new_entries` into the cache file at `path`.
    ///
    /// Waits for any earlier save to the same path, re-reads the file, lays
    /// `new_entries` over it (new entries win), refreshes the in-memory copy
    /// and writes the result. Failures are logged, never returned: a stale
    /// cache must not fail the build.
    pub async fn save(&self, path: &Path, new_entries: LinkCardCache) {
        let slot = self.write_slot(path).await;
        let _turn = slot.lock().await;

        let count = new_entries.len();
        let mut merged = read_cache_file(path).await;
        merged.extend(new_entries);

        self.inner
            .memory
            .write()
            .await
            .insert(path.to_path_buf(), merged.clone());

        match write_cache_file(path, &merged).await {
            Ok(()) => tracing::info!(path = %path.display(), count, "Link card cache saved"),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to save link card cache")
            }
        }
    }

    /// Fire-and-forget [`save`](Self::save). The write runs on the current
    /// Tokio runtime; [`flush`](Self::flush) waits for it.
    pub fn save_detached(&self, path: &Path, new_entries: LinkCardCache) {
        let this = self.clone();
        let path = path.to_path_buf();
        let handle = tokio::spawn(async move { this.save(&path, new_entries).await });
        self.inner
            .detached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Merge entries into the in-memory copy only. Nothing is written.
    pub async fn add_to_memory(&self, path: &Path, entries: LinkCardCache) {
        self.inner
            .memory
            .write()
            .await
            .entry(path.to_path_buf())
            .or_default()
            .extend(entries);
    }

    /// Wait for every detached and in-flight write. Call before the process
    /// exits.
    pub async fn flush(&self) {
        let handles = std::mem::take(
            &mut *self
                .inner
                .detached
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Detached link card cache save did not complete");
            }
        }

        let slots: Vec<_> = self.inner.write_queue.lock().await.values().cloned().collect();
        for slot in slots {
            drop(slot.lock().await);
        }
    }

    /// Forget every in-memory copy; the next `load` reads from disk again.
    pub async fn clear_memory(&self) {
        self.inner.memory.write().await.clear();
    }

    async fn write_slot(&self, path: &Path) -> Arc<Mutex<()>> {
        self.inner
            .write_queue
            .lock()
            .await
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }
}

/// `true` while `entry` is younger than `max_age`. An entry exactly
/// `max_age` old is expired.
pub fn is_valid(entry: &LinkMetadata, max_age: Duration) -> bool {
    is_valid_at(entry, max_age, Utc::now())
}

pub fn is_valid_at(entry: &LinkMetadata, max_age: Duration, now: DateTime<Utc>) -> bool {
    let age_ms = now.signed_duration_since(entry.fetched_at).num_milliseconds();
    let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
    age_ms < max_age_ms
}

// ── File I/O ───────────────────────────────────────────────────────────────

async fn read_cache_file(path: &Path) -> LinkCardCache {
    match try_read_cache_file(path).await {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to load link card cache");
            LinkCardCache::new()
        }
    }
}

/// Entries are decoded one by one. A malformed entry is logged and skipped;
/// the rest of the file still loads.
async fn try_read_cache_file(path: &Path) -> LinkCardResult<LinkCardCache> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LinkCardCache::new()),
        Err(e) => return Err(e.into()),
    };

    let raw: BTreeMap<String, Value> = serde_json::from_str(&content)?;
    let cache = raw
        .into_iter()
        .filter_map(|(url, entry)| match serde_json::from_value::<LinkMetadata>(entry) {
            Ok(meta) => Some((url, meta)),
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Skipping malformed cache entry");
                None
            }
        })
        .collect();
    Ok(cache)
}

/// Write to a uniquely named sibling and rename it into place, so readers in
/// other processes never observe a half-written file.
async fn write_cache_file(path: &Path, cache: &LinkCardCache) -> LinkCardResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(cache)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "link-cards.json".to_string());
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    tokio::fs::write(&temp_path, json).await?;
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

// ── Unit tests ─────────────────────────────────────────────────────────────
