// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::offline::TrainingSetDef;
use plume_core::ResourceKind;

fn rows() -> Vec<ResourceRecord> {
    vec![
        ResourceRecord::new("a", 1i64, 0),
        ResourceRecord::new("b", 2i64, 0),
        ResourceRecord::new("c", 3i64, 0),
        ResourceRecord::new("d", 4i64, 0),
        ResourceRecord::new("e", 5i64, 0),
    ]
}

fn feature_id(name: &str) -> ResourceId {
    ResourceId::new(name, "", ResourceKind::Feature)
}

#[tokio::test]
async fn instances_are_shared_by_name() {
    let a = memory_offline("shared-by-name");
    let b = memory_offline("shared-by-name");
    a.seed_external_table("t", rows());
    let id = ResourceId::new("src", "", ResourceKind::Primary);
    b.register_primary_from_existing(&id, "t").await.unwrap();
    assert!(a.get_primary_table(&id).await.is_ok());
}

#[tokio::test]
async fn provider_get_reconstructs_from_config() {
    let store = memory_offline("reconstruct");
    let config = store.config();
    let provider = crate::get(ProviderType::MemoryOffline, &config).unwrap();
    let offline = provider.as_offline().unwrap();
    assert_eq!(offline.provider_type(), ProviderType::MemoryOffline);
    assert!(provider.as_online().is_err());
}

#[tokio::test]
async fn create_primary_table_is_empty_and_unique() {
    let store = memory_offline("create-primary");
    let id = ResourceId::new("fresh", "", ResourceKind::Primary);
    store.create_primary_table(&id, TableSchema::resource(ValueType::Int)).await.unwrap();
    assert_eq!(store.get_primary_table(&id).await.unwrap(), primary_table_name(&id));

    let err = store.create_primary_table(&id, TableSchema::resource(ValueType::Int)).await.unwrap_err();
    assert!(matches!(err, ProviderError::TableAlreadyExists(_)));
}

#[tokio::test]
async fn register_primary_missing_external_table() {
    let store = memory_offline("missing-external");
    let id = ResourceId::new("ghost", "", ResourceKind::Primary);
    let err = store.register_primary_from_existing(&id, "ghost_table").await.unwrap_err();
    assert_eq!(err, ProviderError::ExternalTableNotFound("ghost_table".to_string()));
}

#[tokio::test]
async fn create_table_already_exists_is_typed() {
    let store = memory_online("typed-already-exists");
    store.create_table("f", "v", ValueType::Int).await.unwrap();
    let err = store.create_table("f", "v", ValueType::Int).await.unwrap_err();
    assert!(matches!(err, ProviderError::TableAlreadyExists(_)));
}

#[tokio::test]
async fn materialization_takes_latest_per_entity_in_entity_order() {
    let store = memory_offline("latest-per-entity");
    let id = feature_id("f");
    let table = store.create_resource_table(&id, TableSchema::resource(ValueType::Int)).await.unwrap();
    table.write(ResourceRecord::new("b", 10i64, 0)).await.unwrap();
    table.write(ResourceRecord::new("a", 1i64, 0)).await.unwrap();
    table.write(ResourceRecord::new("b", 20i64, 5)).await.unwrap();
    table.write(ResourceRecord::new("b", 15i64, 3)).await.unwrap();

    let mat = store.create_materialization(&id).await.unwrap();
    assert_eq!(mat.num_rows(), 2);
    let segment = mat.segment(0, 2);
    assert_eq!(segment[0], ResourceRecord::new("a", 1i64, 0));
    assert_eq!(segment[1], ResourceRecord::new("b", 20i64, 5));

    // Snapshots are retrievable by ID, e.g. from a chunk worker.
    let fetched = store.get_materialization(mat.id()).await.unwrap();
    assert_eq!(fetched.num_rows(), 2);
}

#[tokio::test]
async fn materialization_segment_clamps_to_bounds() {
    let store = memory_offline("segment-clamp");
    let id = feature_id("f");
    let table = store.create_resource_table(&id, TableSchema::resource(ValueType::Int)).await.unwrap();
    for record in rows() {
        table.write(record).await.unwrap();
    }
    let mat = store.create_materialization(&id).await.unwrap();
    assert_eq!(mat.segment(3, 100).len(), 2);
    assert_eq!(mat.segment(10, 20).len(), 0);
}

#[tokio::test]
async fn training_set_joins_label_with_features() {
    let store = memory_offline("ts-join");
    let fid = feature_id("f");
    let lid = ResourceId::new("l", "", ResourceKind::Label);
    let ft = store.create_resource_table(&fid, TableSchema::resource(ValueType::Int)).await.unwrap();
    let lt = store.create_resource_table(&lid, TableSchema::resource(ValueType::Int)).await.unwrap();
    for record in rows() {
        ft.write(record.clone()).await.unwrap();
        lt.write(record).await.unwrap();
    }

    let ts_id = ResourceId::new("ts", "", ResourceKind::TrainingSet);
    store
        .create_training_set(TrainingSetDef {
            id: ts_id.clone(),
            label: lid,
            features: vec![fid],
        })
        .await
        .unwrap();

    let mut iter = store.get_training_set(&ts_id).await.unwrap();
    let mut seen = 0;
    while iter.next_row() {
        let expected = Value::Int(seen + 1);
        assert_eq!(iter.features(), &[expected.clone()]);
        assert_eq!(iter.label(), Some(&expected));
        seen += 1;
    }
    assert_eq!(seen, 5);
}

#[tokio::test]
async fn training_set_join_is_point_in_time() {
    let store = memory_offline("ts-pit");
    let fid = feature_id("f");
    let lid = ResourceId::new("l", "", ResourceKind::Label);
    let ft = store.create_resource_table(&fid, TableSchema::resource(ValueType::Int)).await.unwrap();
    let lt = store.create_resource_table(&lid, TableSchema::resource(ValueType::Int)).await.unwrap();

    // Feature history for one entity; the label sits between updates.
    ft.write(ResourceRecord::new("a", 1i64, 0)).await.unwrap();
    ft.write(ResourceRecord::new("a", 2i64, 10)).await.unwrap();
    ft.write(ResourceRecord::new("a", 3i64, 20)).await.unwrap();
    lt.write(ResourceRecord::new("a", 100i64, 15)).await.unwrap();

    let ts_id = ResourceId::new("ts", "", ResourceKind::TrainingSet);
    store
        .create_training_set(TrainingSetDef {
            id: ts_id.clone(),
            label: lid,
            features: vec![fid],
        })
        .await
        .unwrap();

    let rows: Vec<_> = store.get_training_set(&ts_id).await.unwrap().collect();
    assert_eq!(rows.len(), 1);
    // Latest feature value at or before ts=15 is 2, not 3.
    assert_eq!(rows[0].features, vec![Value::Int(2)]);
    assert_eq!(rows[0].label, Value::Int(100));
}

#[tokio::test]
async fn training_set_missing_feature_value_is_nil() {
    let store = memory_offline("ts-nil");
    let fid = feature_id("f");
    let lid = ResourceId::new("l", "", ResourceKind::Label);
    store.create_resource_table(&fid, TableSchema::resource(ValueType::Int)).await.unwrap();
    let lt = store.create_resource_table(&lid, TableSchema::resource(ValueType::Int)).await.unwrap();
    lt.write(ResourceRecord::new("a", 1i64, 0)).await.unwrap();

    let ts_id = ResourceId::new("ts", "", ResourceKind::TrainingSet);
    store
        .create_training_set(TrainingSetDef { id: ts_id.clone(), label: lid, features: vec![fid] })
        .await
        .unwrap();
    let rows: Vec<_> = store.get_training_set(&ts_id).await.unwrap().collect();
    assert_eq!(rows[0].features, vec![Value::Nil]);
}

#[tokio::test]
async fn online_round_trip() {
    let store = memory_online("round-trip");
    let table = store.create_table("f", "v", ValueType::Int).await.unwrap();
    table.set("a", Value::Int(7)).await.unwrap();
    let fetched = store.get_table("f", "v").await.unwrap();
    assert_eq!(fetched.get("a").await.unwrap(), Value::Int(7));
    assert!(fetched.get("zzz").await.is_err());
}

#[test]
fn unknown_provider_type_is_rejected() {
    assert!(matches!(ProviderType::parse("GHOST_PROVIDER"), Err(ProviderError::UnknownType(_))));
}

#[test]
fn external_driver_types_have_no_in_tree_driver() {
    let err = crate::get(ProviderType::PostgresOffline, &SerializedConfig::default()).unwrap_err();
    assert_eq!(err, ProviderError::NoDriver(ProviderType::PostgresOffline));
}
