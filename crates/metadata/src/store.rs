// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination store: a key-value space with prefix watch and lease-bound
//! mutexes.
//!
//! [`MemoryStore`] is the in-process implementation; an etcd-backed
//! implementation plugs in behind the same trait for multi-node
//! deployments. Reads and writes are strongly consistent.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by a coordination store backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),
}

/// What happened to a watched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Put,
    Delete,
}

/// One observed change under a watched prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    pub key: String,
    pub kind: WatchEventKind,
    pub value: Option<Vec<u8>>,
}

/// Held mutual exclusion on a store key. Dropping the guard releases the
/// lock; a crashed holder is released by lease expiry instead.
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Key-value store with watch, lease, and mutex primitives.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete a key; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// All current entries under a prefix, in key order.
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Subscribe to changes under a prefix. The receiver sees every put and
    /// delete after subscription; pair with [`KvStore::get_prefix`] for the
    /// existing state.
    async fn watch_prefix(&self, prefix: &str) -> mpsc::UnboundedReceiver<WatchEvent>;

    /// Try to acquire the mutex on `key` with a lease of `ttl`.
    /// Returns `None` when another holder owns an unexpired lease.
    async fn try_lock(&self, key: &str, ttl: Duration) -> Result<Option<LockGuard>, StoreError>;
}

struct LockEntry {
    token: u64,
    expires: Instant,
}

struct Watcher {
    prefix: String,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    locks: HashMap<String, LockEntry>,
    watchers: Vec<Watcher>,
    next_token: u64,
}

impl Inner {
    fn broadcast(&mut self, event: WatchEvent) {
        self.watchers
            .retain(|w| !event.key.starts_with(&w.prefix) || w.tx.send(event.clone()).is_ok());
    }
}

/// In-process coordination store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.data.insert(key.to_string(), value.clone());
        inner.broadcast(WatchEvent {
            key: key.to_string(),
            kind: WatchEventKind::Put,
            value: Some(value),
        });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.lock().data.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let existed = inner.data.remove(key).is_some();
        if existed {
            inner.broadcast(WatchEvent {
                key: key.to_string(),
                kind: WatchEventKind::Delete,
                value: None,
            });
        }
        Ok(existed)
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn watch_prefix(&self, prefix: &str) -> mpsc::UnboundedReceiver<WatchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().watchers.push(Watcher { prefix: prefix.to_string(), tx });
        rx
    }

    async fn try_lock(&self, key: &str, ttl: Duration) -> Result<Option<LockGuard>, StoreError> {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        if let Some(entry) = inner.locks.get(key) {
            if entry.expires > now {
                return Ok(None);
            }
        }
        inner.next_token += 1;
        let token = inner.next_token;
        inner.locks.insert(key.to_string(), LockEntry { token, expires: now + ttl });

        let store = self.inner.clone();
        let key = key.to_string();
        Ok(Some(LockGuard::new(move || {
            let mut inner = store.lock();
            // Only the holder's own lease may be released; an expired lease
            // reclaimed by another coordinator stays theirs.
            if inner.locks.get(&key).is_some_and(|e| e.token == token) {
                inner.locks.remove(&key);
            }
        })))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
