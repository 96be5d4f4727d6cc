// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator core: watch loops, the job execution protocol, and the
//! per-resource-kind routines.

use crate::spawner::{JobSpawner, ScheduleParams};
use crate::template::resolve_template;
use crate::CoordinatorError;
use plume_core::{
    lock_key, Clock, NameVariant, ResourceId, ResourceKind, ResourceStatus, SystemClock,
};
use plume_metadata::{
    KvStore, MetadataClient, MetadataError, SourceDefinition, SourceVariant, WatchEventKind,
};
use plume_provider::{
    primary_table_name, transformation_table_name, OfflineStore, OnlineStore, ProviderType,
    TrainingSetDef,
};
use plume_runner::{
    CompletionWatcher as _, CreateTrainingSetRunnerConfig, CreateTransformationRunnerConfig,
    MaterializeRunnerConfig, CREATE_TRAINING_SET, CREATE_TRANSFORMATION, MATERIALIZE,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Tunables for a coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Lease on per-resource locks. Short, so a crashed coordinator's
    /// jobs are reclaimed quickly.
    pub lock_ttl: Duration,
    /// Backoff between retries of a job whose dependency is not ready.
    pub job_retry_backoff: Duration,
    /// Coordination-store endpoints handed to cluster workers.
    pub endpoints: Vec<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(5),
            job_retry_backoff: Duration::from_secs(1),
            endpoints: Vec::new(),
        }
    }
}

/// What a successful per-kind routine produced.
struct JobOutcome {
    status: ResourceStatus,
    /// Runner name + config for scheduled re-runs, when the kind has one.
    scheduled: Option<ScheduledWork>,
}

struct ScheduledWork {
    runner_name: &'static str,
    config: Vec<u8>,
}

/// Watches metadata for work, claims resources behind distributed locks,
/// and drives the resource state machine.
pub struct Coordinator<C: Clock = SystemClock> {
    metadata: MetadataClient,
    store: Arc<dyn KvStore>,
    spawner: Arc<dyn JobSpawner>,
    clock: C,
    config: CoordinatorConfig,
}

impl<C: Clock> Coordinator<C> {
    pub fn new(
        metadata: MetadataClient,
        spawner: Arc<dyn JobSpawner>,
        clock: C,
        config: CoordinatorConfig,
    ) -> Self {
        let store = metadata.store();
        Self { metadata, store, spawner, clock, config }
    }

    pub fn metadata(&self) -> &MetadataClient {
        &self.metadata
    }

    /// Run both reconciliation loops until the shutdown signal flips.
    pub async fn run(
        self: Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), CoordinatorError> {
        let mut jobs = self.metadata.watch_jobs().await;
        let mut updates = self.metadata.watch_updates().await;

        // Existing keys first: work enqueued before this coordinator came up.
        for key in self.metadata.list_jobs().await? {
            self.clone().spawn_job_task(key);
        }
        for (key, _) in self.store.get_prefix(plume_core::UPDATE_PREFIX).await? {
            self.clone().spawn_update_task(key);
        }

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = jobs.recv() => match event {
                    Some(ev) if ev.kind == WatchEventKind::Put => {
                        self.clone().spawn_job_task(ev.key);
                    }
                    Some(_) => {}
                    None => break,
                },
                event = updates.recv() => match event {
                    Some(ev) if ev.kind == WatchEventKind::Put => {
                        self.clone().spawn_update_task(ev.key);
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }
        tracing::info!("coordinator stopped");
        Ok(())
    }

    fn spawn_job_task(self: Arc<Self>, key: String) {
        tokio::spawn(async move {
            loop {
                match self.execute_job(&key).await {
                    Ok(()) => break,
                    Err(e) if e.is_dependency_pending() => {
                        // Job key stays in place; try again shortly.
                        tracing::info!(key = %key, error = %e, "dependency pending, backing off");
                        tokio::time::sleep(self.config.job_retry_backoff).await;
                    }
                    Err(e) => {
                        tracing::error!(key = %key, error = %e, "job failed");
                        break;
                    }
                }
            }
        });
    }

    fn spawn_update_task(self: Arc<Self>, key: String) {
        tokio::spawn(async move {
            if let Err(e) = self.execute_update(&key).await {
                tracing::error!(key = %key, error = %e, "update reconciliation failed");
            }
        });
    }

    /// The job execution protocol for one `JOB__` key.
    ///
    /// Lock contention is not an error: another coordinator owns the job.
    /// A transient [`CoordinatorError::DependencyPending`] leaves the job
    /// key in place for retry; any other failure marks the resource
    /// *failed* and consumes the key.
    pub async fn execute_job(&self, job_key: &str) -> Result<(), CoordinatorError> {
        let id = ResourceId::from_job_key(job_key)?;
        let Some(_guard) = self.store.try_lock(&lock_key(job_key), self.config.lock_ttl).await?
        else {
            tracing::debug!(key = %job_key, "lock busy, another coordinator owns the job");
            return Ok(());
        };

        let stored = match self.metadata.get_resource(&id).await {
            Ok(stored) => stored,
            Err(MetadataError::NotFound(_)) => {
                self.metadata.delete_job(&id).await?;
                return Err(MetadataError::NotFound(id).into());
            }
            Err(e) => return Err(e.into()),
        };
        if stored.status.is_ready() {
            // Already done; idempotent dispatch consumes the stale key.
            self.metadata.delete_job(&id).await?;
            return Ok(());
        }
        if matches!(stored.status, ResourceStatus::Created | ResourceStatus::Failed) {
            self.metadata.set_status(&id, ResourceStatus::Pending, "").await?;
        }
        tracing::info!(resource = %id, "job claimed");

        let schedule = stored.def.schedule().to_string();
        let outcome = match id.kind {
            ResourceKind::Source => self.run_source_job(&id).await,
            ResourceKind::Feature => self.run_feature_materialize_job(&id).await,
            ResourceKind::TrainingSet => self.run_training_set_job(&id).await,
            _ => Err(CoordinatorError::UnexpectedKind(id.clone())),
        };

        match outcome {
            Ok(outcome) => {
                self.metadata.set_status(&id, outcome.status, "").await?;
                if !schedule.is_empty() {
                    self.install_schedule(&id, &schedule, outcome.scheduled).await;
                }
                self.metadata.delete_job(&id).await?;
                tracing::info!(resource = %id, status = %outcome.status, "job complete");
                Ok(())
            }
            Err(e) if e.is_dependency_pending() => Err(e),
            Err(e) => {
                self.metadata.set_status(&id, ResourceStatus::Failed, &e.to_string()).await?;
                self.metadata.delete_job(&id).await?;
                Err(e)
            }
        }
    }

    /// Reconcile one `UPDATE__` key: stamp `LastUpdated`, consume the
    /// event. Status is never touched.
    pub async fn execute_update(&self, update_key: &str) -> Result<(), CoordinatorError> {
        let id = ResourceId::from_update_key(update_key)?;
        let Some(_guard) = self.store.try_lock(&lock_key(update_key), self.config.lock_ttl).await?
        else {
            return Ok(());
        };
        match self.metadata.set_update_status(&id, self.clock.epoch_ms()).await {
            Ok(()) => {}
            Err(MetadataError::NotFound(_)) => {
                tracing::warn!(resource = %id, "update event for deleted resource");
            }
            Err(e) => return Err(e.into()),
        }
        self.metadata.consume_update(&id).await?;
        tracing::info!(resource = %id, "scheduled update recorded");
        Ok(())
    }

    async fn install_schedule(&self, id: &ResourceId, schedule: &str, work: Option<ScheduledWork>) {
        let Some(work) = work else {
            tracing::warn!(resource = %id, "schedule ignored: kind has no re-runnable job");
            return;
        };
        let params = ScheduleParams {
            runner_name: work.runner_name,
            config: &work.config,
            endpoints: &self.config.endpoints,
            id,
            schedule,
        };
        // The resource itself is ready; a broken schedule is logged, not
        // allowed to fail the job.
        if let Err(e) = self.spawner.schedule_job(params).await {
            tracing::error!(resource = %id, error = %e, "failed to install schedule");
        } else {
            tracing::info!(resource = %id, %schedule, "schedule installed");
        }
    }

    /// Source jobs: register a primary table, or run a SQL transformation.
    async fn run_source_job(&self, id: &ResourceId) -> Result<JobOutcome, CoordinatorError> {
        let source = self.metadata.get_source_variant(&id.name_variant()).await?;
        let provider_def = source.fetch_provider(&self.metadata).await?;
        let provider_type = ProviderType::parse(&provider_def.provider_type)?;
        let offline = plume_provider::get(provider_type, &provider_def.config)?.as_offline()?;

        match &source.def.definition {
            SourceDefinition::PrimaryData { location } => {
                if location.name.is_empty() {
                    return Err(CoordinatorError::InvalidDefinition(format!(
                        "primary source {id} names no external table"
                    )));
                }
                offline
                    .register_primary_from_existing(&id.as_kind(ResourceKind::Primary), &location.name)
                    .await?;
                // Re-registration has nothing to re-run on a schedule.
                Ok(JobOutcome { status: ResourceStatus::Ready, scheduled: None })
            }
            SourceDefinition::SqlTransformation { query, sources } => {
                let mapping = self.map_name_variants_to_tables(sources).await?;
                let resolved_sql = resolve_template(query, &mapping)?;
                let config = CreateTransformationRunnerConfig {
                    offline_type: offline.provider_type(),
                    offline_config: offline.config(),
                    resource_id: id.as_kind(ResourceKind::Transformation),
                    resolved_sql,
                }
                .serialize()?;
                self.dispatch(CREATE_TRANSFORMATION, &config, id).await?;
                Ok(JobOutcome {
                    status: ResourceStatus::Ready,
                    scheduled: Some(ScheduledWork { runner_name: CREATE_TRANSFORMATION, config }),
                })
            }
        }
    }

    /// Feature jobs: register the resource table from the source, then
    /// materialize offline to online in chunks.
    async fn run_feature_materialize_job(
        &self,
        id: &ResourceId,
    ) -> Result<JobOutcome, CoordinatorError> {
        let feature = self.metadata.get_feature_variant(&id.name_variant()).await?;
        let source = feature.fetch_source(&self.metadata).await?;
        if !source.status.is_ready() {
            return Err(CoordinatorError::DependencyPending(source.id()));
        }

        let source_provider = source.fetch_provider(&self.metadata).await?;
        let feature_provider = feature.fetch_provider(&self.metadata).await?;
        let offline = plume_provider::get(
            ProviderType::parse(&source_provider.provider_type)?,
            &source_provider.config,
        )?
        .as_offline()?;
        let online = plume_provider::get(
            ProviderType::parse(&feature_provider.provider_type)?,
            &feature_provider.config,
        )?
        .as_online()?;

        let source_table = self.source_table_name(&offline, &source).await?;
        offline
            .register_resource_from_source(id, &source_table, &feature.def.columns)
            .await?;

        let config = MaterializeRunnerConfig {
            online_type: online.provider_type(),
            offline_type: offline.provider_type(),
            online_config: online.config(),
            offline_config: offline.config(),
            resource_id: id.clone(),
            value_type: feature.def.value_type,
            cloud: self.spawner.cloud(),
        }
        .serialize()?;
        self.dispatch(MATERIALIZE, &config, id).await?;
        Ok(JobOutcome {
            status: ResourceStatus::ReadyOnline,
            scheduled: Some(ScheduledWork { runner_name: MATERIALIZE, config }),
        })
    }

    /// Training-set jobs: verify the label and every feature are ready,
    /// then assemble the set in the offline store.
    async fn run_training_set_job(&self, id: &ResourceId) -> Result<JobOutcome, CoordinatorError> {
        let training_set = self.metadata.get_training_set_variant(&id.name_variant()).await?;
        let label = training_set.fetch_label(&self.metadata).await?;
        if !label.status.is_ready() {
            return Err(CoordinatorError::DependencyPending(label.id()));
        }
        let features = training_set.fetch_features(&self.metadata).await?;
        for feature in &features {
            if !feature.status.is_ready() {
                return Err(CoordinatorError::DependencyPending(feature.id()));
            }
        }

        let provider_def = training_set.fetch_provider(&self.metadata).await?;
        let offline = plume_provider::get(
            ProviderType::parse(&provider_def.provider_type)?,
            &provider_def.config,
        )?
        .as_offline()?;

        let config = CreateTrainingSetRunnerConfig {
            offline_type: offline.provider_type(),
            offline_config: offline.config(),
            definition: TrainingSetDef {
                id: id.clone(),
                label: label.id(),
                features: features.iter().map(|f| f.id()).collect(),
            },
        }
        .serialize()?;
        self.dispatch(CREATE_TRAINING_SET, &config, id).await?;
        Ok(JobOutcome {
            status: ResourceStatus::Ready,
            scheduled: Some(ScheduledWork { runner_name: CREATE_TRAINING_SET, config }),
        })
    }

    /// Resolve each dependency to its provider-canonical table name,
    /// failing if any is absent or not ready.
    pub async fn map_name_variants_to_tables(
        &self,
        sources: &[NameVariant],
    ) -> Result<HashMap<String, String>, CoordinatorError> {
        let mut mapping = HashMap::new();
        for nv in sources {
            let dep = self.metadata.get_source_variant(nv).await?;
            if !dep.status.is_ready() {
                return Err(CoordinatorError::DependencyPending(dep.id()));
            }
            let table = match &dep.def.definition {
                SourceDefinition::PrimaryData { .. } => {
                    primary_table_name(&dep.id().as_kind(ResourceKind::Primary))
                }
                SourceDefinition::SqlTransformation { .. } => {
                    transformation_table_name(&dep.id().as_kind(ResourceKind::Transformation))
                }
            };
            mapping.insert(nv.key(), table);
        }
        Ok(mapping)
    }

    /// The offline table a ready source resolves to.
    async fn source_table_name(
        &self,
        offline: &Arc<dyn OfflineStore>,
        source: &SourceVariant,
    ) -> Result<String, CoordinatorError> {
        let name = match &source.def.definition {
            SourceDefinition::PrimaryData { .. } => {
                offline.get_primary_table(&source.id().as_kind(ResourceKind::Primary)).await?
            }
            SourceDefinition::SqlTransformation { .. } => {
                offline
                    .get_transformation_table(&source.id().as_kind(ResourceKind::Transformation))
                    .await?
            }
        };
        Ok(name)
    }

    /// Hand a runner to the spawner and await its watcher.
    async fn dispatch(
        &self,
        runner_name: &str,
        config: &[u8],
        id: &ResourceId,
    ) -> Result<(), CoordinatorError> {
        let runner =
            self.spawner.get_job_runner(runner_name, config, &self.config.endpoints, id)?;
        let watcher = runner.run().await?;
        watcher.wait().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
