//! Culler retention worker runtime.

#![forbid(unsafe_code)]

mod task_pool;
mod worker_config;

use std::env;
use std::sync::Arc;

use culler_application::{PackageCatalog, RetentionSweepService, SweepOutcome};
use culler_core::{AppError, AppResult};
use culler_infrastructure::{
    ChannelRetentionTaskDispatcher, CodeArtifactPackageCatalog, RedisRetentionTaskQueue,
};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::task_pool::{PoolSummary, RetentionTaskPool};
use crate::worker_config::{DispatchMode, WorkerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerCommand {
    /// Consume package tasks and run scheduled sweeps until shutdown.
    Serve,
    /// Run the configured sweep once and exit.
    Sweep,
}

impl WorkerCommand {
    fn from_args() -> AppResult<Self> {
        match env::args().nth(1).as_deref() {
            None => Ok(Self::Serve),
            Some("sweep") => Ok(Self::Sweep),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected no argument or 'sweep'"
            ))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = WorkerCommand::from_args()?;
    let config = WorkerConfig::load()?;
    let catalog: Arc<dyn PackageCatalog> = Arc::new(CodeArtifactPackageCatalog::new(
        config.codeartifact_endpoint_url.clone(),
    ));

    info!(
        worker_id = %config.worker_id,
        command = ?command,
        dispatch_mode = ?config.dispatch_mode,
        keep_latest = config.policy.keep_latest,
        dry_run = config.policy.dry_run,
        max_concurrency = config.max_concurrency,
        "culler-worker started"
    );

    match config.dispatch_mode {
        DispatchMode::Local => run_local(command, &config, catalog).await,
        DispatchMode::Redis => run_redis(command, &config, catalog).await,
    }
}

async fn run_local(
    command: WorkerCommand,
    config: &WorkerConfig,
    catalog: Arc<dyn PackageCatalog>,
) -> AppResult<()> {
    let (dispatcher, receiver) = ChannelRetentionTaskDispatcher::bounded(config.queue_capacity);
    let service = RetentionSweepService::new(catalog, Arc::new(dispatcher), config.policy);
    let pool = RetentionTaskPool::new(
        service.clone(),
        config.worker_id.as_str(),
        config.max_concurrency,
    );

    match command {
        WorkerCommand::Sweep => {
            let event = config.require_sweep()?.event();
            let (finished_sender, finished_receiver) = oneshot::channel::<()>();
            let consumer = tokio::spawn(pool.run(receiver, async move {
                let _ = finished_receiver.await;
            }));

            let outcome = service.handle(event).await;
            let _ = finished_sender.send(());
            let summary = consumer.await.map_err(|error| {
                AppError::Internal(format!("retention task pool stopped unexpectedly: {error}"))
            })?;

            log_sweep_outcome(config.worker_id.as_str(), &outcome?);
            finish_pool(config.worker_id.as_str(), summary)
        }
        WorkerCommand::Serve => {
            if config.sweep.as_ref().and_then(|sweep| sweep.interval).is_none() {
                return Err(AppError::Validation(
                    "local dispatch mode needs RETENTION_SWEEP_INTERVAL_SECONDS to serve"
                        .to_owned(),
                ));
            }

            let schedule = spawn_schedule(config, &service);
            let summary = pool.run(receiver, shutdown_signal()).await;
            if let Some(schedule) = schedule {
                schedule.abort();
            }

            log_pool_summary(config.worker_id.as_str(), summary);
            Ok(())
        }
    }
}

async fn run_redis(
    command: WorkerCommand,
    config: &WorkerConfig,
    catalog: Arc<dyn PackageCatalog>,
) -> AppResult<()> {
    let redis_url = config.redis_url.as_deref().ok_or_else(|| {
        AppError::Validation(
            "REDIS_URL is required when RETENTION_DISPATCH_MODE is 'redis'".to_owned(),
        )
    })?;
    let client = redis::Client::open(redis_url)
        .map_err(|error| AppError::Internal(format!("failed to create redis client: {error}")))?;
    let queue = RedisRetentionTaskQueue::connect(client, config.queue_key.as_str()).await?;
    let service = RetentionSweepService::new(catalog, Arc::new(queue.clone()), config.policy);

    match command {
        WorkerCommand::Sweep => {
            let outcome = service.handle(config.require_sweep()?.event()).await?;
            log_sweep_outcome(config.worker_id.as_str(), &outcome);

            match queue.pending_tasks().await {
                Ok(pending_tasks) => info!(
                    worker_id = %config.worker_id,
                    queue_key = %queue.queue_key(),
                    pending_tasks,
                    "retention tasks queued"
                ),
                Err(error) => warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "failed to read retention queue length"
                ),
            }

            Ok(())
        }
        WorkerCommand::Serve => {
            let schedule = spawn_schedule(config, &service);
            let pool = RetentionTaskPool::new(
                service,
                config.worker_id.as_str(),
                config.max_concurrency,
            );

            info!(
                worker_id = %config.worker_id,
                queue_key = %queue.queue_key(),
                poll_seconds = config.queue_poll_interval.as_secs(),
                "consuming retention tasks"
            );

            let (shutdown_sender, shutdown_receiver) = watch::channel(false);
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_sender.send_replace(true);
            });

            let summary = pool
                .run_source(&queue, shutdown_receiver, config.queue_poll_interval)
                .await;

            if let Some(schedule) = schedule {
                schedule.abort();
            }

            log_pool_summary(config.worker_id.as_str(), summary);
            Ok(())
        }
    }
}

fn spawn_schedule(
    config: &WorkerConfig,
    service: &RetentionSweepService,
) -> Option<JoinHandle<()>> {
    let sweep = config.sweep.clone()?;
    let interval = sweep.interval?;
    let service = service.clone();
    let worker_id = config.worker_id.clone();

    info!(
        worker_id = %worker_id,
        repository_arn = %sweep.repository_arn,
        days_to_retain = sweep.days_to_retain,
        interval_seconds = interval.as_secs(),
        "scheduling repository retention sweeps"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match service.handle(sweep.event()).await {
                Ok(outcome) => log_sweep_outcome(worker_id.as_str(), &outcome),
                Err(error) => warn!(
                    worker_id = %worker_id,
                    repository_arn = %sweep.repository_arn,
                    error = %error,
                    "scheduled retention sweep failed"
                ),
            }
        }
    }))
}

fn log_sweep_outcome(worker_id: &str, outcome: &SweepOutcome) {
    match outcome {
        SweepOutcome::Skipped => info!(worker_id, "retention sweep skipped"),
        SweepOutcome::Dispatched(report) => info!(
            worker_id,
            sweep_id = %report.sweep_id,
            invocation_time = %report.invocation_time,
            packages_dispatched = report.packages_dispatched,
            "retention sweep dispatched"
        ),
        SweepOutcome::Processed(report) => info!(
            worker_id,
            versions_eligible = report.versions_eligible.len(),
            versions_deleted = report.versions_deleted,
            "package retention processed"
        ),
    }
}

fn log_pool_summary(worker_id: &str, summary: PoolSummary) {
    info!(
        worker_id,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "retention task pool drained"
    );
}

fn finish_pool(worker_id: &str, summary: PoolSummary) -> AppResult<()> {
    log_pool_summary(worker_id, summary);

    if summary.failed > 0 {
        return Err(AppError::Internal(format!(
            "{} retention task(s) failed",
            summary.failed
        )));
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("shutdown signal received, draining retention tasks");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
