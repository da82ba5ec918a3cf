use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use culler_application::{PolledTask, RetentionSweepService, RetentionTaskSource, SweepOutcome};
use culler_domain::RetentionEvent;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Task counts reported when a pool is drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Bounded pool running package retention tasks concurrently.
///
/// `submit` waits for a free permit, so a saturated pool stops the caller from pulling more
/// tasks off its queue.
pub struct RetentionTaskPool {
    service: RetentionSweepService,
    worker_id: String,
    permits: Arc<Semaphore>,
    running: JoinSet<bool>,
    summary: PoolSummary,
}

impl RetentionTaskPool {
    pub fn new(
        service: RetentionSweepService,
        worker_id: impl Into<String>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            service,
            worker_id: worker_id.into(),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            running: JoinSet::new(),
            summary: PoolSummary::default(),
        }
    }

    pub async fn submit(&mut self, task: RetentionEvent) {
        while let Some(result) = self.running.try_join_next() {
            self.record(result);
        }

        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(error) => {
                warn!(
                    worker_id = %self.worker_id,
                    error = %error,
                    "retention task pool is closed, dropping task"
                );
                self.summary.failed += 1;
                return;
            }
        };

        let service = self.service.clone();
        let worker_id = self.worker_id.clone();
        self.running.spawn(async move {
            let succeeded = execute_task(&service, worker_id.as_str(), task).await;
            drop(permit);
            succeeded
        });
    }

    /// Waits for every running task and returns the final counts.
    pub async fn drain(mut self) -> PoolSummary {
        while let Some(result) = self.running.join_next().await {
            self.record(result);
        }

        self.summary
    }

    /// Consumes tasks from an in-process queue until `shutdown` resolves.
    ///
    /// On shutdown the queue is closed, tasks already buffered are still run, and the pool is
    /// drained before returning.
    pub async fn run<F>(
        mut self,
        mut receiver: mpsc::Receiver<RetentionEvent>,
        shutdown: F,
    ) -> PoolSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut closing = false;

        loop {
            tokio::select! {
                task = receiver.recv() => match task {
                    Some(task) => self.submit(task).await,
                    None => break,
                },
                () = &mut shutdown, if !closing => {
                    debug!(worker_id = %self.worker_id, "closing retention task queue");
                    closing = true;
                    receiver.close();
                }
            }
        }

        self.drain().await
    }

    /// Consumes tasks from a shared queue until `shutdown` turns true.
    ///
    /// Shutdown is only checked between polls and during the idle wait, so a task taken off
    /// the queue is always submitted. A discarded entry does not count as an empty queue.
    pub async fn run_source(
        mut self,
        source: &dyn RetentionTaskSource,
        mut shutdown: watch::Receiver<bool>,
        poll_interval: Duration,
    ) -> PoolSummary {
        loop {
            if *shutdown.borrow() {
                debug!(worker_id = %self.worker_id, "stopped polling retention tasks");
                break;
            }

            let idle = match source.poll_task().await {
                Ok(PolledTask::Task(task)) => {
                    self.submit(task).await;
                    false
                }
                Ok(PolledTask::Discarded) => false,
                Ok(PolledTask::Empty) => true,
                Err(error) => {
                    warn!(
                        worker_id = %self.worker_id,
                        error = %error,
                        "failed to pop retention task"
                    );
                    true
                }
            };

            if idle {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    () = tokio::time::sleep(poll_interval) => {}
                }
            }
        }

        self.drain().await
    }

    fn record(&mut self, result: Result<bool, JoinError>) {
        match result {
            Ok(true) => self.summary.succeeded += 1,
            Ok(false) => self.summary.failed += 1,
            Err(error) => {
                warn!(
                    worker_id = %self.worker_id,
                    error = %error,
                    "retention task aborted"
                );
                self.summary.failed += 1;
            }
        }
    }
}

async fn execute_task(
    service: &RetentionSweepService,
    worker_id: &str,
    task: RetentionEvent,
) -> bool {
    let repository_arn = task.repository_arn.clone();
    let package = task
        .package
        .as_ref()
        .map_or_else(|| "-".to_owned(), ToString::to_string);
    let sweep_id = task.sweep_id;

    match service.handle(task).await {
        Ok(SweepOutcome::Processed(report)) => {
            info!(
                worker_id,
                sweep_id = ?sweep_id,
                repository_arn = %repository_arn,
                package = %package,
                versions_listed = report.versions_listed,
                versions_eligible = report.versions_eligible.len(),
                versions_deleted = report.versions_deleted,
                versions_failed = report.versions_failed.len(),
                dry_run = report.dry_run,
                "package retention task completed"
            );
            true
        }
        Ok(SweepOutcome::Dispatched(report)) => {
            info!(
                worker_id,
                sweep_id = %report.sweep_id,
                repository_arn = %repository_arn,
                packages_dispatched = report.packages_dispatched,
                "queued repository sweep dispatched"
            );
            true
        }
        Ok(SweepOutcome::Skipped) => true,
        Err(error) => {
            warn!(
                worker_id,
                sweep_id = ?sweep_id,
                repository_arn = %repository_arn,
                package = %package,
                error = %error,
                "retention task failed"
            );
            false
        }
    }
}
