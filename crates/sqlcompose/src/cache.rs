//! Structural statement cache.
//!
//! Maps a [`StatementKey`] (builder name, dialect settings and the structural
//! projection of a request) to the statement text composed for it. Keys never contain bound
//! values, so requests that differ only in their literals share one entry.
//!
//! The cache is an explicit service object: create one, share it behind an
//! `Arc`, flush it when the schema changes. There is no eviction.
//!
//! Composition runs outside the lock. Two threads missing the same key both
//! compose, and the later insert wins; composition is a pure function of the
//! key and the schema snapshot, so both texts are identical.

use crate::request::{RequestKey, StatementRequest};
use crate::setting::DbSetting;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Cache key: the statement builder's name, the settings it renders with and
/// the request's structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    pub builder: &'static str,
    pub setting: Arc<DbSetting>,
    pub request: RequestKey,
}

impl StatementKey {
    pub fn new(builder: &'static str, setting: Arc<DbSetting>, request: &StatementRequest) -> Self {
        Self {
            builder,
            setting,
            request: request.key(),
        }
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Texts stored.
    pub inserts: u64,
    /// Explicit flushes.
    pub flushes: u64,
    /// Entries currently held.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache (0 when nothing was looked up).
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe map from request structure to composed text.
#[derive(Debug, Default)]
pub struct StatementCache {
    map: RwLock<HashMap<StatementKey, Arc<str>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    flushes: AtomicU64,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the text stored for `key`, counting a hit or a miss.
    pub fn get(&self, key: &StatementKey) -> Option<Arc<str>> {
        let found = self
            .map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store `text` under `key` (last write wins) and return the shared text.
    pub fn insert(&self, key: StatementKey, text: impl Into<Arc<str>>) -> Arc<str> {
        let text = text.into();
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&text));
        self.inserts.fetch_add(1, Ordering::Relaxed);
        text
    }

    /// Check for an entry without touching the counters.
    pub fn contains(&self, key: &StatementKey) -> bool {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Remove one entry.
    pub fn remove(&self, key: &StatementKey) -> Option<Arc<str>> {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Drop every entry. Counters other than `flushes` are kept.
    pub fn flush(&self) {
        let removed = {
            let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
            let removed = map.len();
            map.clear();
            removed
        };
        self.flushes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "sqlcompose.cache", removed, "statement cache flushed");
    }

    pub fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Reset the counters (entries are kept).
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
    }
}
