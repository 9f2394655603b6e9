//! In-process implementation of [`RoomStore`].
//!
//! Keys live in a `BTreeMap` behind one async mutex, so every operation
//! (including compare-and-swap) is atomic with respect to every other.
//! Expiry is lazy: an expired key is dropped the first time any operation
//! touches it. [`MemoryStore::spawn_sweeper`] additionally purges keys
//! nobody touches again, so orphaned rooms do not leak memory.
//!
//! Time comes from `tokio::time::Instant`, which lets tests pause and
//! advance the clock instead of sleeping.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{Fields, RoomStore, StoreError};

#[derive(Debug, Clone)]
enum Value {
    Hash(Fields),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Keyspace = BTreeMap<String, Entry>;

/// An in-memory key/value store with per-key TTL.
///
/// Cheap to clone: clones share the same keyspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    keys: Arc<Mutex<Keyspace>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired key. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        let before = keys.len();
        keys.retain(|_, entry| !entry.is_expired(now));
        before - keys.len()
    }

    /// Spawns a background task that calls [`purge_expired`](Self::purge_expired)
    /// every `every`. Abort the returned handle to stop it.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "expired keys purged");
                }
            }
        })
    }

    /// Remaining time to live of a key, if it exists and has an expiry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        live(&mut keys, key, now)?
            .expires_at
            .map(|at| at.saturating_duration_since(now))
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let keys = self.keys.lock().await;
        keys.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Returns `true` if no live keys remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Looks up a key, evicting it first if it has expired.
fn live<'a>(keys: &'a mut Keyspace, key: &str, now: Instant) -> Option<&'a mut Entry> {
    if keys.get(key).is_some_and(|e| e.is_expired(now)) {
        keys.remove(key);
        return None;
    }
    keys.get_mut(key)
}

fn hash_mut<'a>(
    keys: &'a mut Keyspace,
    key: &str,
    now: Instant,
) -> Result<Option<&'a mut Fields>, StoreError> {
    match live(keys, key, now) {
        None => Ok(None),
        Some(Entry {
            value: Value::Hash(fields),
            ..
        }) => Ok(Some(fields)),
        Some(_) => Err(StoreError::WrongType(key.to_string())),
    }
}

fn list_mut<'a>(
    keys: &'a mut Keyspace,
    key: &str,
    now: Instant,
) -> Result<Option<&'a mut Vec<String>>, StoreError> {
    match live(keys, key, now) {
        None => Ok(None),
        Some(Entry {
            value: Value::List(items),
            ..
        }) => Ok(Some(items)),
        Some(_) => Err(StoreError::WrongType(key.to_string())),
    }
}

/// Resolves inclusive `start..=stop` list indexes, negative from the end.
fn range_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Glob match supporting `*` (any run) and `?` (any single char).
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

impl RoomStore for MemoryStore {
    async fn set_hash(&self, key: &str, fields: Fields) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        match hash_mut(&mut keys, key, now)? {
            Some(existing) => existing.extend(fields),
            None => {
                keys.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Hash(fields),
                        expires_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn get_hash(&self, key: &str) -> Result<Fields, StoreError> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        Ok(hash_mut(&mut keys, key, now)?.cloned().unwrap_or_default())
    }

    async fn compare_and_swap_hash(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        fields: Fields,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        let Some(current) = hash_mut(&mut keys, key, now)? else {
            if !expected.is_empty() {
                return Ok(false);
            }
            keys.insert(
                key.to_string(),
                Entry {
                    value: Value::Hash(fields),
                    expires_at: None,
                },
            );
            return Ok(true);
        };
        if current.get(field).map_or("", String::as_str) != expected {
            return Ok(false);
        }
        current.extend(fields);
        Ok(true)
    }

    async fn set_expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        Ok(match live(&mut keys, key, now) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                true
            }
            None => false,
        })
    }

    async fn delete_key(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        Ok(keys.remove(key).is_some_and(|e| !e.is_expired(now)))
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        match list_mut(&mut keys, key, now)? {
            Some(items) => {
                items.push(value.to_string());
                Ok(items.len())
            }
            None => {
                keys.insert(
                    key.to_string(),
                    Entry {
                        value: Value::List(vec![value.to_string()]),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let mut keys = self.keys.lock().await;
        let Some(items) = list_mut(&mut keys, key, now)? else {
            return Ok(Vec::new());
        };
        Ok(match range_bounds(items.len(), start, stop) {
            Some((from, to)) => items[from..=to].to_vec(),
            None => Vec::new(),
        })
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let keys = self.keys.lock().await;
        Ok(keys
            .iter()
            .filter(|(k, e)| !e.is_expired(now) && glob_match(pattern, k))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
