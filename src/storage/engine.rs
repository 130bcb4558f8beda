//! Thread-Safe Storage Engine with Expiry Support
//!
//! This module implements the key-value store behind every command. All
//! entries live in one `HashMap` guarded by one `RwLock`: readers (the
//! freshness check in `get`, the sweeper's scan) run concurrently, and any
//! writer (`set`, a delete) is exclusive.
//!
//! ## Expiry
//!
//! Every entry carries an optional deadline. Expired entries are removed in
//! two ways:
//!
//! 1. **Lazy**: `get` notices the deadline has passed and deletes the entry.
//! 2. **Active**: the sweeper calls [`StorageEngine::purge_expired`].
//!
//! Both paths follow the same discipline: check under the read lock, release
//! it, take the write lock and check again before deleting. A `set` that
//! refreshes the key in between wins. The read lock is never upgraded.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates a new entry with TTL.
    pub fn with_ttl(value: Bytes, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Some(Instant::now() + ttl),
        }
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks if this entry has expired at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// The key-value store.
///
/// Designed to be wrapped in an `Arc` and shared by every connection task
/// and the expiry sweeper. All operations are total: absence is `None`,
/// never an error.
///
/// # Example
///
/// ```
/// use resplite::storage::StorageEngine;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let engine = StorageEngine::new();
///
/// engine.set(Bytes::from("name"), Bytes::from("Ariz"), None);
/// assert_eq!(engine.get(&Bytes::from("name")), Some(Bytes::from("Ariz")));
///
/// engine.set(Bytes::from("session"), Bytes::from("abc123"), Some(Duration::from_secs(60)));
/// assert!(engine.get(&Bytes::from("session")).is_some());
/// ```
pub struct StorageEngine {
    data: RwLock<HashMap<Bytes, Entry>>,

    /// TTL applied by `set` when the caller gives none (None = never expire)
    default_ttl: Option<Duration>,

    get_count: AtomicU64,
    set_count: AtomicU64,

    /// Statistics: number of expired keys removed (lazily or by the sweeper)
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("keys", &self.len())
            .field("default_ttl", &self.default_ttl)
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates a store whose entries never expire unless a TTL is given.
    pub fn new() -> Self {
        Self::with_default_ttl(None)
    }

    /// Creates a store that applies `default_ttl` to `set` calls without a TTL.
    pub fn with_default_ttl(default_ttl: Option<Duration>) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            default_ttl,
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// The TTL applied when `set` is called without one.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    // The map is only ever mutated by single insert/remove calls, so a
    // panic elsewhere cannot leave it inconsistent; poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Entry>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Entry>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites `key`.
    ///
    /// Both the value and the expiry are replaced. With `ttl` the entry
    /// expires at `now + ttl`; without it the store's default TTL applies.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new key was created, `false` if an existing key was updated.
    pub fn set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let entry = match ttl.or(self.default_ttl) {
            Some(ttl) => Entry::with_ttl(value, ttl),
            None => Entry::new(value),
        };

        self.write().insert(key, entry).is_none()
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired
    /// entry is removed as a side effect.
    pub fn get(&self, key: &Bytes) -> Option<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        // Fast path under the read lock
        {
            let data = self.read();
            match data.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: re-check under the write lock before deleting
        let mut data = self.write();
        match data.get(key) {
            Some(entry) if entry.is_expired() => {
                data.remove(key);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                None
            }
            // Refreshed by a concurrent SET in between
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Removes every expired entry.
    ///
    /// Scans under the read lock, then takes the write lock once and deletes
    /// only the keys that are still expired at that point.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were removed.
    pub fn purge_expired(&self) -> u64 {
        let candidates: Vec<Bytes> = {
            let data = self.read();
            let now = Instant::now();
            data.iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect()
        };

        if candidates.is_empty() {
            return 0;
        }

        let mut data = self.write();
        let now = Instant::now();
        let mut removed = 0u64;

        for key in candidates {
            if data.get(&key).is_some_and(|entry| entry.is_expired_at(now)) {
                data.remove(&key);
                removed += 1;
            }
        }

        if removed > 0 {
            self.expired_count.fetch_add(removed, Ordering::Relaxed);
        }

        removed
    }

    /// Returns true if `key` is physically present, expired or not.
    pub fn contains_key(&self, key: &Bytes) -> bool {
        self.read().contains_key(key)
    }

    /// Returns every key currently held in the map.
    ///
    /// Entries that have expired but were not reclaimed yet are included;
    /// this reflects what the store holds, not what `get` would return.
    pub fn keys(&self) -> Vec<Bytes> {
        self.read().keys().cloned().collect()
    }

    /// Returns the number of entries held, including unreclaimed expired ones.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns database statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len() as u64,
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys currently stored
    pub keys: u64,
    /// Total GET operations
    pub get_ops: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Total expired keys cleaned up
    pub expired: u64,
}
