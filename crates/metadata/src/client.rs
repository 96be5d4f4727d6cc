// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed metadata client over the coordination store.

use crate::defs::{
    FeatureDef, LabelDef, ProviderDef, ResourceDef, SourceDef, TrainingSetDef, UserDef,
};
use crate::store::{KvStore, WatchEvent};
use crate::MetadataError;
use plume_core::{NameVariant, ResourceId, ResourceKind, ResourceStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

const META_PREFIX: &str = "META__";
const SOURCE_META_PREFIX: &str = "META__SOURCE__";
const PROVIDER_PREFIX: &str = "PROVIDER__";
const USER_PREFIX: &str = "USER__";

fn meta_key(id: &ResourceId) -> String {
    format!("{}{}__{}__{}", META_PREFIX, id.kind, id.name, id.variant)
}

/// A resource definition plus its coordinator-managed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    pub def: ResourceDef,
    pub status: ResourceStatus,
    pub error: Option<String>,
    pub last_updated_ms: Option<u64>,
}

/// Typed view of a stored source variant.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceVariant {
    pub def: SourceDef,
    pub status: ResourceStatus,
    pub error: Option<String>,
    pub last_updated_ms: Option<u64>,
}

impl SourceVariant {
    pub fn id(&self) -> ResourceId {
        self.def.id()
    }

    pub async fn fetch_provider(&self, client: &MetadataClient) -> Result<ProviderDef, MetadataError> {
        client.get_provider(&self.def.provider).await
    }
}

/// Typed view of a stored feature variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVariant {
    pub def: FeatureDef,
    pub status: ResourceStatus,
    pub error: Option<String>,
    pub last_updated_ms: Option<u64>,
}

impl FeatureVariant {
    pub fn id(&self) -> ResourceId {
        self.def.id()
    }

    pub async fn fetch_provider(&self, client: &MetadataClient) -> Result<ProviderDef, MetadataError> {
        client.get_provider(&self.def.provider).await
    }

    pub async fn fetch_source(&self, client: &MetadataClient) -> Result<SourceVariant, MetadataError> {
        client.get_source_variant(&self.def.source).await
    }
}

/// Typed view of a stored label variant.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVariant {
    pub def: LabelDef,
    pub status: ResourceStatus,
    pub error: Option<String>,
    pub last_updated_ms: Option<u64>,
}

impl LabelVariant {
    pub fn id(&self) -> ResourceId {
        self.def.id()
    }

    pub async fn fetch_source(&self, client: &MetadataClient) -> Result<SourceVariant, MetadataError> {
        client.get_source_variant(&self.def.source).await
    }
}

/// Typed view of a stored training-set variant.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSetVariant {
    pub def: TrainingSetDef,
    pub status: ResourceStatus,
    pub error: Option<String>,
    pub last_updated_ms: Option<u64>,
}

impl TrainingSetVariant {
    pub fn id(&self) -> ResourceId {
        self.def.id()
    }

    pub async fn fetch_provider(&self, client: &MetadataClient) -> Result<ProviderDef, MetadataError> {
        client.get_provider(&self.def.provider).await
    }

    pub async fn fetch_label(&self, client: &MetadataClient) -> Result<LabelVariant, MetadataError> {
        client.get_label_variant(&self.def.label).await
    }

    pub async fn fetch_features(
        &self,
        client: &MetadataClient,
    ) -> Result<Vec<FeatureVariant>, MetadataError> {
        let mut features = Vec::with_capacity(self.def.features.len());
        for nv in &self.def.features {
            features.push(client.get_feature_variant(nv).await?);
        }
        Ok(features)
    }
}

/// Typed reads and writes of resource definitions, statuses, and work keys.
#[derive(Clone)]
pub struct MetadataClient {
    store: Arc<dyn KvStore>,
}

impl MetadataClient {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// The backing coordination store (shared with the coordinator's locks).
    pub fn store(&self) -> Arc<dyn KvStore> {
        self.store.clone()
    }

    /// Create a batch of definitions, each in *created* status, enqueueing
    /// a job key for every job-bearing kind. Rejects duplicate resources
    /// and batches that close a transformation dependency cycle.
    pub async fn create_all(&self, defs: Vec<ResourceDef>) -> Result<(), MetadataError> {
        self.reject_cycles(&defs).await?;
        for def in defs {
            match def {
                ResourceDef::User(ref user) => {
                    let key = format!("{}{}", USER_PREFIX, user.name);
                    self.store.put(&key, serde_json::to_vec(user)?).await?;
                }
                ResourceDef::Provider(ref provider) => {
                    let key = format!("{}{}", PROVIDER_PREFIX, provider.name);
                    self.store.put(&key, serde_json::to_vec(provider)?).await?;
                }
                def => {
                    // Job-bearing and plain resources share the key space.
                    let id = match def.id() {
                        Some(id) => id,
                        None => continue,
                    };
                    if self.store.get(&meta_key(&id)).await?.is_some() {
                        return Err(MetadataError::AlreadyExists(id));
                    }
                    let needs_job = def.needs_job();
                    let stored = StoredResource {
                        def,
                        status: ResourceStatus::Created,
                        error: None,
                        last_updated_ms: None,
                    };
                    self.store.put(&meta_key(&id), serde_json::to_vec(&stored)?).await?;
                    if needs_job {
                        self.store.put(&id.job_key(), serde_json::to_vec(&id)?).await?;
                    }
                    tracing::debug!(resource = %id, needs_job, "resource created");
                }
            }
        }
        Ok(())
    }

    /// Walk transformation dependency edges across the batch and the
    /// already-stored sources; reject if they close a cycle.
    async fn reject_cycles(&self, defs: &[ResourceDef]) -> Result<(), MetadataError> {
        let mut edges: HashMap<NameVariant, Vec<NameVariant>> = HashMap::new();
        for def in defs {
            if let ResourceDef::Source(source) = def {
                edges.insert(
                    NameVariant::new(source.name.clone(), source.variant.clone()),
                    source.dependencies().to_vec(),
                );
            }
        }
        for (_, bytes) in self.store.get_prefix(SOURCE_META_PREFIX).await? {
            let stored: StoredResource = serde_json::from_slice(&bytes)?;
            if let ResourceDef::Source(source) = stored.def {
                edges
                    .entry(NameVariant::new(source.name.clone(), source.variant.clone()))
                    .or_insert_with(|| source.dependencies().to_vec());
            }
        }

        let mut done: HashSet<NameVariant> = HashSet::new();
        for start in edges.keys() {
            let mut on_path: HashSet<NameVariant> = HashSet::new();
            let mut stack = vec![(start.clone(), 0usize)];
            while let Some((nv, next_child)) = stack.pop() {
                if next_child == 0 {
                    if on_path.contains(&nv) {
                        return Err(MetadataError::CyclicDependency(nv.key()));
                    }
                    if done.contains(&nv) {
                        continue;
                    }
                    on_path.insert(nv.clone());
                }
                let children = edges.get(&nv).map(Vec::as_slice).unwrap_or(&[]);
                if next_child < children.len() {
                    let child = children[next_child].clone();
                    stack.push((nv, next_child + 1));
                    stack.push((child, 0));
                } else {
                    on_path.remove(&nv);
                    done.insert(nv);
                }
            }
        }
        Ok(())
    }

    pub async fn get_resource(&self, id: &ResourceId) -> Result<StoredResource, MetadataError> {
        let bytes = self
            .store
            .get(&meta_key(id))
            .await?
            .ok_or_else(|| MetadataError::NotFound(id.clone()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn put_resource(
        &self,
        id: &ResourceId,
        stored: &StoredResource,
    ) -> Result<(), MetadataError> {
        self.store.put(&meta_key(id), serde_json::to_vec(stored)?).await?;
        Ok(())
    }

    pub async fn get_source_variant(&self, nv: &NameVariant) -> Result<SourceVariant, MetadataError> {
        let id = ResourceId::new(nv.name.clone(), nv.variant.clone(), ResourceKind::Source);
        let stored = self.get_resource(&id).await?;
        match stored.def {
            ResourceDef::Source(def) => Ok(SourceVariant {
                def,
                status: stored.status,
                error: stored.error,
                last_updated_ms: stored.last_updated_ms,
            }),
            other => Err(wrong_kind(id, "source", &other)),
        }
    }

    pub async fn get_feature_variant(
        &self,
        nv: &NameVariant,
    ) -> Result<FeatureVariant, MetadataError> {
        let id = ResourceId::new(nv.name.clone(), nv.variant.clone(), ResourceKind::Feature);
        let stored = self.get_resource(&id).await?;
        match stored.def {
            ResourceDef::Feature(def) => Ok(FeatureVariant {
                def,
                status: stored.status,
                error: stored.error,
                last_updated_ms: stored.last_updated_ms,
            }),
            other => Err(wrong_kind(id, "feature", &other)),
        }
    }

    pub async fn get_label_variant(&self, nv: &NameVariant) -> Result<LabelVariant, MetadataError> {
        let id = ResourceId::new(nv.name.clone(), nv.variant.clone(), ResourceKind::Label);
        let stored = self.get_resource(&id).await?;
        match stored.def {
            ResourceDef::Label(def) => Ok(LabelVariant {
                def,
                status: stored.status,
                error: stored.error,
                last_updated_ms: stored.last_updated_ms,
            }),
            other => Err(wrong_kind(id, "label", &other)),
        }
    }

    pub async fn get_training_set_variant(
        &self,
        nv: &NameVariant,
    ) -> Result<TrainingSetVariant, MetadataError> {
        let id = ResourceId::new(nv.name.clone(), nv.variant.clone(), ResourceKind::TrainingSet);
        let stored = self.get_resource(&id).await?;
        match stored.def {
            ResourceDef::TrainingSet(def) => Ok(TrainingSetVariant {
                def,
                status: stored.status,
                error: stored.error,
                last_updated_ms: stored.last_updated_ms,
            }),
            other => Err(wrong_kind(id, "training set", &other)),
        }
    }

    pub async fn get_provider(&self, name: &str) -> Result<ProviderDef, MetadataError> {
        let bytes = self
            .store
            .get(&format!("{}{}", PROVIDER_PREFIX, name))
            .await?
            .ok_or_else(|| MetadataError::ProviderNotFound(name.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_user(&self, name: &str) -> Result<Option<UserDef>, MetadataError> {
        match self.store.get(&format!("{}{}", USER_PREFIX, name)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Advance a resource's status. Enforces the monotone state machine.
    pub async fn set_status(
        &self,
        id: &ResourceId,
        status: ResourceStatus,
        error_msg: &str,
    ) -> Result<(), MetadataError> {
        let mut stored = self.get_resource(id).await?;
        if !stored.status.can_advance_to(status) {
            return Err(MetadataError::InvalidTransition {
                id: id.clone(),
                from: stored.status,
                to: status,
            });
        }
        stored.status = status;
        stored.error = (!error_msg.is_empty()).then(|| error_msg.to_string());
        self.put_resource(id, &stored).await?;
        tracing::info!(resource = %id, %status, "status updated");
        Ok(())
    }

    /// Record a scheduled update's completion time. Status is untouched.
    pub async fn set_update_status(
        &self,
        id: &ResourceId,
        last_updated_ms: u64,
    ) -> Result<(), MetadataError> {
        let mut stored = self.get_resource(id).await?;
        stored.last_updated_ms = Some(last_updated_ms);
        self.put_resource(id, &stored).await?;
        Ok(())
    }

    /// Whether work is still enqueued for the resource.
    pub async fn has_job(&self, id: &ResourceId) -> Result<bool, MetadataError> {
        Ok(self.store.get(&id.job_key()).await?.is_some())
    }

    /// Re-enqueue work for an existing resource (scheduled re-runs).
    pub async fn create_job(&self, id: &ResourceId) -> Result<(), MetadataError> {
        self.store.put(&id.job_key(), serde_json::to_vec(id)?).await?;
        Ok(())
    }

    /// Mark enqueued work done. Returns whether the key existed.
    pub async fn delete_job(&self, id: &ResourceId) -> Result<bool, MetadataError> {
        Ok(self.store.delete(&id.job_key()).await?)
    }

    /// Write the update-event key for a fired schedule.
    pub async fn signal_update(&self, id: &ResourceId) -> Result<(), MetadataError> {
        self.store.put(&id.update_key(), serde_json::to_vec(id)?).await?;
        Ok(())
    }

    /// Consume an observed update event.
    pub async fn consume_update(&self, id: &ResourceId) -> Result<bool, MetadataError> {
        Ok(self.store.delete(&id.update_key()).await?)
    }

    /// Subscribe to job-key changes.
    pub async fn watch_jobs(&self) -> mpsc::UnboundedReceiver<WatchEvent> {
        self.store.watch_prefix(plume_core::JOB_PREFIX).await
    }

    /// Subscribe to update-event changes.
    pub async fn watch_updates(&self) -> mpsc::UnboundedReceiver<WatchEvent> {
        self.store.watch_prefix(plume_core::UPDATE_PREFIX).await
    }

    /// Currently enqueued job keys.
    pub async fn list_jobs(&self) -> Result<Vec<String>, MetadataError> {
        Ok(self
            .store
            .get_prefix(plume_core::JOB_PREFIX)
            .await?
            .into_iter()
            .map(|(k, _)| k)
            .collect())
    }
}

fn wrong_kind(id: ResourceId, expected: &'static str, actual: &ResourceDef) -> MetadataError {
    let actual = match actual {
        ResourceDef::User(_) => "user",
        ResourceDef::Provider(_) => "provider",
        ResourceDef::Source(_) => "source",
        ResourceDef::Feature(_) => "feature",
        ResourceDef::Label(_) => "label",
        ResourceDef::TrainingSet(_) => "training set",
    };
    MetadataError::WrongKind { id, expected, actual }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
