//! In-process task queue feeding the local retention worker pool.

use async_trait::async_trait;
use culler_application::RetentionTaskDispatcher;
use culler_core::{AppError, AppResult};
use culler_domain::RetentionEvent;
use tokio::sync::mpsc;

/// Dispatcher that hands package tasks to a bounded in-process channel.
///
/// The receiving half is drained by the worker pool; a full channel applies backpressure to the
/// sweep that is submitting tasks.
#[derive(Clone)]
pub struct ChannelRetentionTaskDispatcher {
    sender: mpsc::Sender<RetentionEvent>,
}

impl ChannelRetentionTaskDispatcher {
    /// Creates a dispatcher and the receiver that consumes its tasks.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<RetentionEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl RetentionTaskDispatcher for ChannelRetentionTaskDispatcher {
    async fn dispatch(&self, task: RetentionEvent) -> AppResult<()> {
        self.sender.send(task).await.map_err(|error| {
            AppError::Dispatch(format!(
                "retention task queue is closed, dropped task for '{}'",
                error.0.repository_arn
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use culler_application::RetentionTaskDispatcher;
    use culler_core::AppError;
    use culler_domain::{PackageDescriptor, RetentionEvent};

    use super::ChannelRetentionTaskDispatcher;

    const ARN: &str = "arn:aws:codeartifact:us-east-1:123456789012:repository/acme/internal";

    fn task(name: &str) -> RetentionEvent {
        RetentionEvent::for_repository(ARN, 30).for_package(
            PackageDescriptor::new("npm", name, None).unwrap_or_else(|_| unreachable!()),
            Utc::now(),
            uuid::Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn dispatched_tasks_arrive_in_submission_order() {
        let (dispatcher, mut receiver) = ChannelRetentionTaskDispatcher::bounded(4);

        assert!(dispatcher.dispatch(task("first")).await.is_ok());
        assert!(dispatcher.dispatch(task("second")).await.is_ok());

        let received = [receiver.recv().await, receiver.recv().await]
            .into_iter()
            .flatten()
            .filter_map(|event| event.package.map(|package| package.name().to_owned()))
            .collect::<Vec<_>>();
        assert_eq!(received, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn dispatch_fails_once_the_pool_is_gone() {
        let (dispatcher, receiver) = ChannelRetentionTaskDispatcher::bounded(1);
        drop(receiver);

        let result = dispatcher.dispatch(task("orphan")).await;
        assert!(matches!(result, Err(AppError::Dispatch(_))));
    }
}
