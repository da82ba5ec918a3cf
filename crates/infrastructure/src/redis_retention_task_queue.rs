//! Redis-backed distributed queue for package retention tasks.

use async_trait::async_trait;
use culler_application::{PolledTask, RetentionTaskDispatcher, RetentionTaskSource};
use culler_core::{AppError, AppResult};
use culler_domain::RetentionEvent;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::warn;

/// Redis list used as a task queue shared by every worker process.
///
/// Producers `LPUSH` JSON-encoded tasks; workers `RPOP` them, so tasks are consumed in
/// submission order. Every clone shares one reconnecting connection.
#[derive(Clone)]
pub struct RedisRetentionTaskQueue {
    connection: ConnectionManager,
    queue_key: String,
}

impl RedisRetentionTaskQueue {
    /// Connects to Redis and creates one queue adapter.
    pub async fn connect(client: redis::Client, queue_key: impl Into<String>) -> AppResult<Self> {
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|error| AppError::Dispatch(format!("failed to connect to redis: {error}")))?;

        Ok(Self {
            connection,
            queue_key: queue_key.into(),
        })
    }

    /// Returns the Redis key of the queue.
    #[must_use]
    pub fn queue_key(&self) -> &str {
        self.queue_key.as_str()
    }

    /// Returns the number of queued tasks.
    pub async fn pending_tasks(&self) -> AppResult<usize> {
        let mut connection = self.connection.clone();
        connection
            .llen(self.queue_key.as_str())
            .await
            .map_err(|error| AppError::Dispatch(format!("failed to read queue length: {error}")))
    }
}

#[async_trait]
impl RetentionTaskDispatcher for RedisRetentionTaskQueue {
    async fn dispatch(&self, task: RetentionEvent) -> AppResult<()> {
        let payload = serde_json::to_string(&task).map_err(|error| {
            AppError::Internal(format!("failed to encode retention task: {error}"))
        })?;

        let mut connection = self.connection.clone();
        connection
            .lpush::<_, _, ()>(self.queue_key.as_str(), payload)
            .await
            .map_err(|error| AppError::Dispatch(format!("failed to enqueue retention task: {error}")))
    }
}

#[async_trait]
impl RetentionTaskSource for RedisRetentionTaskQueue {
    /// Pops the oldest queued task.
    ///
    /// A payload that does not decode as a task is logged and removed so it cannot block the
    /// queue.
    async fn poll_task(&self) -> AppResult<PolledTask> {
        let mut connection = self.connection.clone();
        let payload: Option<String> = connection
            .rpop(self.queue_key.as_str(), None)
            .await
            .map_err(|error| {
                AppError::Dispatch(format!("failed to pop retention task: {error}"))
            })?;

        Ok(payload.map_or(PolledTask::Empty, |payload| {
            decode_task(self.queue_key.as_str(), payload.as_str())
        }))
    }
}

fn decode_task(queue_key: &str, payload: &str) -> PolledTask {
    match serde_json::from_str::<RetentionEvent>(payload) {
        Ok(task) => PolledTask::Task(task),
        Err(error) => {
            warn!(
                queue_key,
                error = %error,
                "dropping undecodable retention task payload"
            );
            PolledTask::Discarded
        }
    }
}

#[cfg(test)]
mod tests {
    use culler_application::PolledTask;
    use culler_domain::RetentionEvent;

    use super::decode_task;

    const ARN: &str = "arn:aws:codeartifact:us-east-1:123456789012:repository/acme/releases";

    #[test]
    fn dispatched_payload_decodes_as_a_task() {
        let task = RetentionEvent::for_repository(ARN, 30);
        let payload = serde_json::to_string(&task).unwrap_or_default();

        assert_eq!(
            decode_task("culler:retention:tasks", payload.as_str()),
            PolledTask::Task(task)
        );
    }

    #[test]
    fn undecodable_payload_is_discarded_not_empty() {
        for payload in ["not json", "{}", r#"{"repository_arn":42}"#] {
            assert_eq!(
                decode_task("culler:retention:tasks", payload),
                PolledTask::Discarded,
                "{payload}"
            );
        }
    }
}
