// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use plume_core::{ResourceKind, Value};
use plume_provider::{
    memory_offline, memory_online, OfflineStore, OnlineStore, OnlineTable, ResourceRecord,
    ResourceTable, TableSchema,
};
use proptest::prelude::*;

#[test]
fn chunk_layout_small_table_is_one_chunk() {
    assert_eq!(chunk_layout(5), (5, 1));
    assert_eq!(chunk_layout(1), (1, 1));
    assert_eq!(chunk_layout(1024), (1024, 1));
}

#[test]
fn chunk_layout_empty_table_is_zero_chunks() {
    assert_eq!(chunk_layout(0), (0, 0));
}

#[test]
fn chunk_layout_large_table_has_partial_tail() {
    assert_eq!(chunk_layout(1025), (1024, 2));
    assert_eq!(chunk_layout(2048), (1024, 2));
    assert_eq!(chunk_layout(10_000), (1024, 10));
}

proptest! {
    #[test]
    fn chunk_layout_covers_all_rows(num_rows in 0u64..1_000_000) {
        let (chunk_size, num_chunks) = chunk_layout(num_rows);
        prop_assert!(chunk_size <= MAX_CHUNK_ROWS);
        // Every row is covered.
        prop_assert!(num_chunks * chunk_size >= num_rows);
        // At most one partial chunk: all but the last chunk are full.
        if num_chunks > 0 {
            prop_assert!((num_chunks - 1) * chunk_size < num_rows);
        } else {
            prop_assert_eq!(num_rows, 0);
        }
    }
}

#[tokio::test]
async fn materialize_locally_copies_every_row() {
    registry::register_builtin();
    let offline = memory_offline("materialize-local");
    let online = memory_online("materialize-local");
    let id = plume_core::ResourceId::new("f", "v", ResourceKind::Feature);

    let table = offline
        .create_resource_table(&id, TableSchema::resource(plume_core::ValueType::Int))
        .await
        .unwrap();
    for (i, entity) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        table.write(ResourceRecord::new(*entity, (i + 1) as i64, 0)).await.unwrap();
    }

    let runner = MaterializeRunner::new(
        online.clone(),
        offline.clone(),
        id.clone(),
        plume_core::ValueType::Int,
        JobCloud::Local,
    );
    let watcher = runner.run().await.unwrap();
    watcher.wait().await.unwrap();
    assert!(watcher.complete());

    let online_table = online.get_table("f", "v").await.unwrap();
    for (i, entity) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        assert_eq!(online_table.get(entity).await.unwrap(), Value::Int((i + 1) as i64));
    }
}

#[tokio::test]
async fn materialize_empty_feature_completes_and_creates_table() {
    registry::register_builtin();
    let offline = memory_offline("materialize-empty");
    let online = memory_online("materialize-empty");
    let id = plume_core::ResourceId::new("empty", "v", ResourceKind::Feature);

    offline
        .create_resource_table(&id, TableSchema::resource(plume_core::ValueType::Int))
        .await
        .unwrap();

    let runner = MaterializeRunner::new(
        online.clone(),
        offline.clone(),
        id,
        plume_core::ValueType::Int,
        JobCloud::Local,
    );
    let watcher = runner.run().await.unwrap();
    watcher.wait().await.unwrap();

    // Zero chunks launched, but the online table exists.
    assert!(online.get_table("empty", "v").await.is_ok());
}

#[tokio::test]
async fn materialize_is_idempotent_on_existing_online_table() {
    registry::register_builtin();
    let offline = memory_offline("materialize-idem");
    let online = memory_online("materialize-idem");
    let id = plume_core::ResourceId::new("f", "v", ResourceKind::Feature);

    let table = offline
        .create_resource_table(&id, TableSchema::resource(plume_core::ValueType::Int))
        .await
        .unwrap();
    table.write(ResourceRecord::new("a", 1i64, 0)).await.unwrap();
    online.create_table("f", "v", plume_core::ValueType::Int).await.unwrap();

    let runner =
        MaterializeRunner::new(online, offline, id, plume_core::ValueType::Int, JobCloud::Local);
    // The pre-existing table is swallowed as already-exists.
    runner.run().await.unwrap().wait().await.unwrap();
}

#[tokio::test]
async fn materialize_round_trips_through_config() {
    registry::register_builtin();
    let offline = memory_offline("materialize-config");
    let online = memory_online("materialize-config");
    let id = plume_core::ResourceId::new("f", "v", ResourceKind::Feature);
    let table = offline
        .create_resource_table(&id, TableSchema::resource(plume_core::ValueType::Int))
        .await
        .unwrap();
    table.write(ResourceRecord::new("a", 42i64, 0)).await.unwrap();

    let config = MaterializeRunnerConfig {
        online_type: online.provider_type(),
        offline_type: offline.provider_type(),
        online_config: online.config(),
        offline_config: offline.config(),
        resource_id: id,
        value_type: plume_core::ValueType::Int,
        cloud: JobCloud::Local,
    };
    let runner = registry::create(crate::MATERIALIZE, &config.serialize().unwrap()).unwrap();
    runner.run().await.unwrap().wait().await.unwrap();

    let online_table = online.get_table("f", "v").await.unwrap();
    assert_eq!(online_table.get("a").await.unwrap(), Value::Int(42));
}
