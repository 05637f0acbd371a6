use crate::parser::Extraction;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    extraction: Extraction,
    stored_at: Instant,
}

/// Time-expiring results keyed by channel URL
///
/// Concurrent misses on the same key both fetch; the last writer wins.
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    expiry: Duration,
}

impl ResultCache {
    pub fn new(expiry: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry,
        }
    }

    /// Returns a stored result that has not expired
    ///
    /// An expired entry is removed on the way out.
    pub fn get(&self, key: &str) -> Option<Extraction> {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.expiry => {
                Some(entry.extraction.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a result, dropping expired entries first so the map stays bounded
    pub fn insert(&self, key: &str, extraction: Extraction) {
        let now = Instant::now();
        let mut entries = self.lock();

        let purged = self.retain_fresh(&mut entries, now);
        if purged > 0 {
            tracing::debug!("Purged {} expired cache entries", purged);
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                extraction,
                stored_at: now,
            },
        );
    }

    /// Drops every expired entry and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        self.retain_fresh(&mut entries, Instant::now())
    }

    fn retain_fresh(&self, entries: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.stored_at) < self.expiry);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
