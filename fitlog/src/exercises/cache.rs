//! Read-through cache for exercise names.
//!
//! Entries are keyed per language and live for a fixed TTL. A miss fetches
//! from the [`ExerciseSource`]; if that fails the caller gets an empty list and
//! nothing is stored, so the next call tries upstream again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};
use wger_client::ExerciseName;

use super::source::ExerciseSource;
use crate::config::DEFAULT_CACHE_TTL;

#[derive(Clone)]
struct CacheEntry {
    names: Arc<Vec<ExerciseName>>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(names: Arc<Vec<ExerciseName>>, ttl: Duration) -> Self {
        Self {
            names,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// How a lookup was satisfied.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// A live entry was returned without contacting upstream.
    Hit(Arc<Vec<ExerciseName>>),
    /// Upstream was fetched and the result stored.
    Refreshed(Arc<Vec<ExerciseName>>),
    /// Upstream failed; nothing was stored.
    Degraded,
}

impl CacheLookup {
    /// Collapse into the list handed to callers (empty when degraded).
    pub fn into_names(self) -> Vec<ExerciseName> {
        match self {
            Self::Hit(names) | Self::Refreshed(names) => {
                Arc::try_unwrap(names).unwrap_or_else(|shared| (*shared).clone())
            }
            Self::Degraded => Vec::new(),
        }
    }
}

pub struct ExerciseNameCache {
    source: Arc<dyn ExerciseSource>,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ExerciseNameCache {
    pub fn new(source: Arc<dyn ExerciseSource>) -> Self {
        Self::with_ttl(source, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(source: Arc<dyn ExerciseSource>, ttl: Duration) -> Self {
        Self {
            source,
            entries: DashMap::new(),
            ttl,
        }
    }

    fn key(language: u32) -> String {
        format!("exercise_names_{language}")
    }

    fn live_entry(&self, key: &str) -> Option<Arc<Vec<ExerciseName>>> {
        let entry = self.entries.get(key)?;

        if !entry.is_expired() {
            return Some(entry.names.clone());
        }

        drop(entry); // release the shard lock before removing
        self.evict_if_expired(key);
        None
    }

    /// Remove `key` only if the entry stored under it is still expired.
    ///
    /// A concurrent lookup may have replaced it with a fresh entry since the
    /// caller's check; that entry must survive.
    fn evict_if_expired(&self, key: &str) -> bool {
        self.entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
    }

    /// Resolve the names for `language`, reporting how the result was obtained.
    #[instrument(skip(self))]
    pub async fn lookup(&self, language: u32) -> CacheLookup {
        let key = Self::key(language);

        if let Some(names) = self.live_entry(&key) {
            debug!(count = names.len(), "Exercise names served from cache");
            return CacheLookup::Hit(names);
        }

        match self.source.exercise_names(language).await {
            Ok(names) => {
                let names = Arc::new(names);
                self.entries
                    .insert(key, CacheEntry::new(names.clone(), self.ttl));
                info!(count = names.len(), "Exercise names cached");
                CacheLookup::Refreshed(names)
            }
            Err(e) => {
                error!(
                    error = %e,
                    upstream_status = ?e.status(),
                    "Failed to fetch exercise names, serving empty list"
                );
                CacheLookup::Degraded
            }
        }
    }

    /// Names for `language`; empty when upstream is unavailable.
    pub async fn get_exercise_names(&self, language: u32) -> Vec<ExerciseName> {
        self.lookup(language).await.into_names()
    }

    /// Case-insensitive exact match on the trimmed name.
    pub async fn find_by_name(&self, language: u32, name: &str) -> Option<ExerciseName> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        match self.lookup(language).await {
            CacheLookup::Hit(names) | CacheLookup::Refreshed(names) => names
                .iter()
                .find(|n| n.name.trim().to_lowercase() == wanted)
                .cloned(),
            CacheLookup::Degraded => None,
        }
    }

    pub fn invalidate_all(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        info!(dropped, "Exercise name cache cleared");
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.len(),
            ttl: self.ttl,
        }
    }

    /// Spawn the periodic expiry sweep. Stops when `cancel_token` fires.
    pub fn start_eviction(self: &Arc<Self>, interval: Duration, cancel_token: CancellationToken) {
        let cache = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        debug!("Exercise cache eviction task shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        let removed = cache.cleanup_expired();
                        if removed > 0 {
                            debug!(removed, "Evicted expired exercise name entries");
                        }
                    }
                }
            }
        });
    }
}

/// Statistics about the exercise name cache.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entry_count: usize,
    pub ttl: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use wger_client::WgerError;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl CountingSource {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExerciseSource for CountingSource {
        async fn exercise_names(&self, language: u32) -> Result<Vec<ExerciseName>, WgerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(WgerError::Parse("upstream unavailable".to_string()));
            }
            Ok(vec![
                ExerciseName {
                    id: 7,
                    name: "Squat".to_string(),
                    category: "Legs".to_string(),
                },
                ExerciseName {
                    id: u64::from(language),
                    name: format!("Language {language}"),
                    category: "Uncategorized".to_string(),
                },
            ])
        }
    }

    fn cache_with(source: &Arc<CountingSource>, ttl: Duration) -> ExerciseNameCache {
        ExerciseNameCache::with_ttl(source.clone(), ttl)
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_a_hit() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, DEFAULT_CACHE_TTL);

        assert!(matches!(cache.lookup(2).await, CacheLookup::Refreshed(_)));
        assert!(matches!(cache.lookup(2).await, CacheLookup::Hit(_)));
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_refetch() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, DEFAULT_CACHE_TTL);

        let first = cache.get_exercise_names(2).await;
        cache.invalidate_all();
        assert!(cache.is_empty());
        let second = cache.get_exercise_names(2).await;

        assert_eq!(first, second);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_degrades_without_caching() {
        let source = Arc::new(CountingSource::default());
        source.failing.store(true, Ordering::SeqCst);
        let cache = cache_with(&source, DEFAULT_CACHE_TTL);

        assert!(matches!(cache.lookup(2).await, CacheLookup::Degraded));
        assert!(cache.get_exercise_names(2).await.is_empty());
        assert!(cache.is_empty());
        assert_eq!(source.calls(), 2);

        source.failing.store(false, Ordering::SeqCst);
        assert_eq!(cache.get_exercise_names(2).await.len(), 2);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, Duration::ZERO);

        cache.get_exercise_names(2).await;
        assert!(matches!(cache.lookup(2).await, CacheLookup::Refreshed(_)));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_languages_are_cached_separately() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, DEFAULT_CACHE_TTL);

        let english = cache.get_exercise_names(2).await;
        let german = cache.get_exercise_names(1).await;

        assert_ne!(english, german);
        assert_eq!(cache.len(), 2);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, Duration::ZERO);

        cache.get_exercise_names(2).await;
        cache.get_exercise_names(1).await;
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.cleanup_expired(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_name_ignores_case_and_whitespace() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, DEFAULT_CACHE_TTL);

        let found = cache.find_by_name(2, "  sQuAt ").await;
        assert_eq!(found.map(|n| n.id), Some(7));
        assert!(cache.find_by_name(2, "Deadlift").await.is_none());
        assert!(cache.find_by_name(2, "   ").await.is_none());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_expired_path_keeps_replacement_entry() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, DEFAULT_CACHE_TTL);
        let key = ExerciseNameCache::key(2);
        let names = Arc::new(Vec::new());

        cache
            .entries
            .insert(key.clone(), CacheEntry::new(names.clone(), Duration::ZERO));
        assert!(cache.entries.get(&key).is_some_and(|e| e.is_expired()));

        // Another lookup stores a fresh entry before the stale one is evicted.
        cache
            .entries
            .insert(key.clone(), CacheEntry::new(names, DEFAULT_CACHE_TTL));

        assert!(!cache.evict_if_expired(&key));
        assert_eq!(cache.len(), 1);
        assert!(cache.live_entry(&key).is_some());
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let source = Arc::new(CountingSource::default());
        let cache = cache_with(&source, DEFAULT_CACHE_TTL);
        let key = ExerciseNameCache::key(2);

        cache
            .entries
            .insert(key.clone(), CacheEntry::new(Arc::new(Vec::new()), Duration::ZERO));

        assert!(cache.live_entry(&key).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_eviction_sweeps_until_cancelled() {
        let source = Arc::new(CountingSource::default());
        let cache = Arc::new(cache_with(&source, Duration::ZERO));
        cache.get_exercise_names(2).await;

        let cancel = CancellationToken::new();
        cache.start_eviction(Duration::from_millis(10), cancel.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.is_empty());

        cancel.cancel();
        // Give the task time to observe the cancellation and exit.
        tokio::time::sleep(Duration::from_millis(30)).await;

        cache.get_exercise_names(2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The expired entry is still there: no sweep ran after cancel.
        assert_eq!(cache.stats().entry_count, 1);
    }
}
