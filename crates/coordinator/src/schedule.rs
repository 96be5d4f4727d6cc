// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled updates.
//!
//! Resource schedules are standard five-field cron expressions; empty
//! means no schedule. On a cluster the schedule becomes a CronJob object;
//! locally an in-process timer re-runs the stored runner config and
//! writes the resource's `UPDATE__` key on success, which the update
//! watch loop reconciles into `LastUpdated`.

use crate::CoordinatorError;
use chrono::Utc;
use cron::Schedule;
use plume_core::ResourceId;
use plume_metadata::MetadataClient;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Parse a five-field cron expression.
///
/// The underlying parser wants a seconds field; a fixed `0` is prepended
/// so firings land on the minute.
pub fn parse_schedule(schedule: &str) -> Result<Schedule, CoordinatorError> {
    let fields = schedule.split_whitespace().count();
    if fields != 5 {
        return Err(CoordinatorError::InvalidSchedule {
            schedule: schedule.to_string(),
            reason: format!("expected 5 fields, got {fields}"),
        });
    }
    Schedule::from_str(&format!("0 {}", schedule.trim())).map_err(|e| {
        CoordinatorError::InvalidSchedule { schedule: schedule.to_string(), reason: e.to_string() }
    })
}

/// Validate a schedule without keeping the parse.
pub fn validate_schedule(schedule: &str) -> Result<(), CoordinatorError> {
    parse_schedule(schedule).map(|_| ())
}

/// Time until the schedule next fires, from now.
pub fn until_next_fire(schedule: &Schedule) -> Option<Duration> {
    let now = Utc::now();
    let next = schedule.after(&now).next()?;
    (next - now).to_std().ok()
}

/// Run a stored runner config on a local cron timer.
///
/// Each firing re-creates the runner from the registry and awaits its
/// watcher; success writes the resource's update-event key. A firing that
/// fails (typically a dependency no longer ready, or an idempotence
/// signal from the provider) is skipped with a log line; the next tick
/// tries again.
pub fn spawn_local_schedule(
    metadata: MetadataClient,
    id: ResourceId,
    schedule: Schedule,
    runner_name: String,
    config: Vec<u8>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(wait) = until_next_fire(&schedule) else {
                tracing::warn!(resource = %id, "schedule has no future firings, stopping");
                break;
            };
            tokio::time::sleep(wait).await;

            let outcome = async {
                let runner = plume_runner::create(&runner_name, &config)?;
                let watcher = runner.run().await?;
                watcher.wait().await
            }
            .await;

            match outcome {
                Ok(()) => {
                    tracing::info!(resource = %id, runner = %runner_name, "scheduled run complete");
                    if let Err(e) = metadata.signal_update(&id).await {
                        tracing::error!(resource = %id, error = %e, "failed to write update event");
                    }
                }
                Err(e) => {
                    tracing::warn!(resource = %id, error = %e, "scheduled run skipped");
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
