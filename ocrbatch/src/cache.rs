use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Thread-safe, run-scoped cache of recognized text keyed by input path.
///
/// Uses the Arc<Mutex<>> pattern so clones share the same entries across
/// workers. An empty string is a valid entry and means "no text found".
/// Entries are never invalidated when the underlying file changes.
#[derive(Clone)]
pub struct RecognitionCache {
    entries: Arc<Mutex<LruCache<String, String>>>,
    in_flight: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl RecognitionCache {
    /// Create a cache holding at most `capacity` paths; `0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Arc::new(Mutex::new(entries)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Retrieve the cached text for `path`, if any.
    pub fn get(&self, path: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(path).cloned()
    }

    /// Store recognized text for `path`, replacing any previous value.
    pub fn put(&self, path: impl Into<String>, text: impl Into<String>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(path.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize work on a single path.
    ///
    /// Holding the returned guard across check-then-recognize means a
    /// duplicate path submitted in the same batch waits for the first one
    /// and then finds its result in the cache. The slot is dropped again once
    /// nobody holds or waits for it.
    pub async fn lock_path(&self, path: &str) -> PathGuard {
        let slot = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                in_flight
                    .entry(path.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        PathGuard {
            path: path.to_string(),
            in_flight: Arc::clone(&self.in_flight),
            guard: Some(slot.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive hold on one path, returned by [`RecognitionCache::lock_path`].
pub struct PathGuard {
    path: String,
    in_flight: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        // Waiters clone the slot under this lock, so two references (map and
        // guard) means nobody else is queued on it.
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(OwnedMutexGuard::mutex(&guard)) == 2 {
            in_flight.remove(&self.path);
        }
        drop(guard);
    }
}

impl Default for RecognitionCache {
    fn default() -> Self {
        Self::unbounded()
    }
}
