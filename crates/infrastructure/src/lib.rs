//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod channel_retention_task_dispatcher;
mod codeartifact_package_catalog;
mod redis_retention_task_queue;

pub use channel_retention_task_dispatcher::ChannelRetentionTaskDispatcher;
pub use codeartifact_package_catalog::CodeArtifactPackageCatalog;
pub use redis_retention_task_queue::RedisRetentionTaskQueue;
