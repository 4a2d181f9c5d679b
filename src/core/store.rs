/// Short-lived key/value storage for the chat layer
///
/// Holds per-user session tokens and actions waiting on a login. Created at
/// startup and handed to whoever needs it; entries disappear when they expire
/// or are deleted on logout.

use crate::core::command::CommandKind;
use crate::intelligence::ExtractedParams;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Keyed store with optional expiry
pub trait Store<V>: Send + Sync {
    /// Current value, `None` if absent or expired
    fn get(&self, key: &str) -> Option<V>;

    /// Insert or replace. `ttl = None` means the store's default.
    fn set(&self, key: &str, value: V, ttl: Option<Duration>);

    /// Remove and return the value, if it was still live
    fn delete(&self, key: &str) -> Option<V>;

    /// Drop every expired entry, returning how many went
    fn purge_expired(&self) -> usize;
}

/// A command that was blocked on login and should run right after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub command: CommandKind,
    pub params: ExtractedParams,
    pub created_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn new(command: CommandKind, params: ExtractedParams) -> Self {
        Self {
            command,
            params,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Option<DateTime<Utc>>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process store behind a mutex
pub struct MemoryStore<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    default_ttl: Option<Duration>,
}

impl<V> MemoryStore<V> {
    /// Entries never expire unless `set` is given a ttl
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl: None,
        }
    }

    /// Entries expire after `ttl` unless `set` says otherwise
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl: Some(ttl),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock leaves the map itself intact
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Store<V> for MemoryStore<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let expired = entries.get(key)?.is_expired(Utc::now());

        if expired {
            entries.remove(key);
            tracing::debug!(key, "store entry expired");
            return None;
        }

        entries.get(key).map(|e| e.value.clone())
    }

    fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        let expires_at = ttl.or(self.default_ttl).map(|ttl| Utc::now() + ttl);
        self.lock().insert(key.to_string(), Entry { value, expires_at });
    }

    fn delete(&self, key: &str) -> Option<V> {
        let entry = self.lock().remove(key)?;
        (!entry.is_expired(Utc::now())).then_some(entry.value)
    }

    fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));

        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "purged expired store entries");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_get_delete() {
        let store: MemoryStore<String> = MemoryStore::new();
        store.set("U1", "token-1".to_string(), None);

        assert_eq!(store.get("U1"), Some("token-1".to_string()));
        assert_eq!(store.delete("U1"), Some("token-1".to_string()));
        assert_eq!(store.get("U1"), None);
        assert_eq!(store.delete("U1"), None);
    }

    #[test]
    fn test_expired_entries_are_invisible() {
        let store: MemoryStore<String> = MemoryStore::new();
        store.set("U1", "stale".to_string(), Some(Duration::seconds(-1)));

        assert_eq!(store.get("U1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_default_ttl_applies() {
        let store: MemoryStore<u32> = MemoryStore::with_ttl(Duration::seconds(-1));
        store.set("a", 1, None);
        store.set("b", 2, Some(Duration::hours(1)));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some(2));
    }

    #[test]
    fn test_delete_of_expired_returns_none() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store.set("a", 1, Some(Duration::seconds(-1)));
        assert_eq!(store.delete("a"), None);
    }

    #[test]
    fn test_shared_across_threads() {
        let store: Arc<MemoryStore<usize>> = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.set(&format!("user-{}", i), i, None))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 8);
        assert_eq!(store.get("user-3"), Some(3));
    }
}
