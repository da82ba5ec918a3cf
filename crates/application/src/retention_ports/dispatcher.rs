use async_trait::async_trait;
use culler_core::AppResult;
use culler_domain::RetentionEvent;

/// Port for submitting package tasks produced by a repository sweep.
///
/// Submission is fire-and-forget: a successful return means the task was accepted for
/// execution, not that it ran.
#[async_trait]
pub trait RetentionTaskDispatcher: Send + Sync {
    /// Submits one package-level retention task.
    async fn dispatch(&self, task: RetentionEvent) -> AppResult<()>;
}

/// Result of taking one entry off a task source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolledTask {
    /// A decoded task, now owned by the caller.
    Task(RetentionEvent),
    /// Nothing was queued.
    Empty,
    /// An entry was removed but could not be decoded as a task.
    Discarded,
}

/// Port for consuming package tasks from a shared queue.
#[async_trait]
pub trait RetentionTaskSource: Send + Sync {
    /// Removes the oldest queued entry.
    async fn poll_task(&self) -> AppResult<PolledTask>;
}
