// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion watchers: uniform handles over in-flight runner work.

use crate::RunnerError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Observable handle over a unit of runner work.
#[async_trait]
pub trait CompletionWatcher: Send + Sync {
    /// Whether the work has reached a terminal state. Non-blocking.
    fn complete(&self) -> bool;

    /// Block until terminal, returning the error if the work failed.
    async fn wait(&self) -> Result<(), RunnerError>;

    /// The terminal error, if the work has failed.
    fn err(&self) -> Option<RunnerError>;
}

type Outcome = Option<Result<(), RunnerError>>;

/// Watcher backed by a one-shot done signal set by a producer task.
pub struct SyncWatcher {
    outcome: Arc<Mutex<Outcome>>,
    done_rx: watch::Receiver<bool>,
}

/// Producer half of a [`SyncWatcher`]. Call [`WatchSignal::finish`] exactly
/// once when the work reaches a terminal state.
pub struct WatchSignal {
    outcome: Arc<Mutex<Outcome>>,
    done_tx: watch::Sender<bool>,
}

/// Create a linked watcher/signal pair.
pub fn sync_watcher() -> (SyncWatcher, WatchSignal) {
    let outcome = Arc::new(Mutex::new(None));
    let (done_tx, done_rx) = watch::channel(false);
    (SyncWatcher { outcome: outcome.clone(), done_rx }, WatchSignal { outcome, done_tx })
}

impl WatchSignal {
    /// Mark the work terminal with the given result.
    pub fn finish(self, result: Result<(), RunnerError>) {
        *self.outcome.lock() = Some(result);
        let _ = self.done_tx.send(true);
    }
}

#[async_trait]
impl CompletionWatcher for SyncWatcher {
    fn complete(&self) -> bool {
        self.outcome.lock().is_some()
    }

    async fn wait(&self) -> Result<(), RunnerError> {
        let mut rx = self.done_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                // Producer dropped without finishing.
                break;
            }
        }
        match self.outcome.lock().clone() {
            Some(result) => result,
            None => Err(RunnerError::Failed("runner abandoned its watcher".to_string())),
        }
    }

    fn err(&self) -> Option<RunnerError> {
        match &*self.outcome.lock() {
            Some(Err(e)) => Some(e.clone()),
            _ => None,
        }
    }
}

/// Aggregate watcher over a list of children.
///
/// Complete when every child is complete. `wait` awaits every child to
/// completion (no leaked workers) and reports the first error observed.
pub struct WatcherMultiplex {
    children: Vec<Box<dyn CompletionWatcher>>,
}

impl WatcherMultiplex {
    pub fn new(children: Vec<Box<dyn CompletionWatcher>>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl CompletionWatcher for WatcherMultiplex {
    fn complete(&self) -> bool {
        self.children.iter().all(|c| c.complete())
    }

    async fn wait(&self) -> Result<(), RunnerError> {
        let mut first_err = None;
        for child in &self.children {
            if let Err(e) = child.wait().await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn err(&self) -> Option<RunnerError> {
        self.children.iter().find_map(|c| c.err())
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
