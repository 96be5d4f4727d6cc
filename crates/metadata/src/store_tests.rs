// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn put_get_delete_round_trip() {
    let store = MemoryStore::new();
    store.put("k1", b"v1".to_vec()).await.unwrap();
    assert_eq!(store.get("k1").await.unwrap(), Some(b"v1".to_vec()));
    assert!(store.delete("k1").await.unwrap());
    assert!(!store.delete("k1").await.unwrap());
    assert_eq!(store.get("k1").await.unwrap(), None);
}

#[tokio::test]
async fn get_prefix_returns_only_matching_keys_in_order() {
    let store = MemoryStore::new();
    store.put("JOB__b", vec![2]).await.unwrap();
    store.put("JOB__a", vec![1]).await.unwrap();
    store.put("UPDATE__a", vec![3]).await.unwrap();

    let entries = store.get_prefix("JOB__").await.unwrap();
    let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["JOB__a", "JOB__b"]);
}

#[tokio::test]
async fn watch_sees_puts_and_deletes_under_prefix() {
    let store = MemoryStore::new();
    let mut rx = store.watch_prefix("JOB__").await;

    store.put("JOB__x", vec![1]).await.unwrap();
    store.put("OTHER__y", vec![2]).await.unwrap();
    store.delete("JOB__x").await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.key, "JOB__x");
    assert_eq!(first.kind, WatchEventKind::Put);
    assert_eq!(first.value, Some(vec![1]));

    let second = rx.recv().await.unwrap();
    assert_eq!(second.key, "JOB__x");
    assert_eq!(second.kind, WatchEventKind::Delete);
}

#[tokio::test]
async fn lock_is_mutually_exclusive() {
    let store = MemoryStore::new();
    let ttl = Duration::from_secs(5);
    let guard = store.try_lock("LOCK__r", ttl).await.unwrap();
    assert!(guard.is_some());
    assert!(store.try_lock("LOCK__r", ttl).await.unwrap().is_none());

    drop(guard);
    assert!(store.try_lock("LOCK__r", ttl).await.unwrap().is_some());
}

#[tokio::test]
async fn expired_lease_is_reclaimable() {
    let store = MemoryStore::new();
    let guard = store.try_lock("LOCK__r", Duration::from_millis(10)).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Lease expired: a second coordinator reclaims the lock even though
    // the first guard is still alive.
    let second = store.try_lock("LOCK__r", Duration::from_secs(5)).await.unwrap();
    assert!(second.is_some());

    // The stale guard must not release the reclaimed lease.
    drop(guard);
    assert!(store.try_lock("LOCK__r", Duration::from_secs(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn distinct_keys_lock_independently() {
    let store = MemoryStore::new();
    let ttl = Duration::from_secs(5);
    let _a = store.try_lock("LOCK__a", ttl).await.unwrap().unwrap();
    assert!(store.try_lock("LOCK__b", ttl).await.unwrap().is_some());
}
