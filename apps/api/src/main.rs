//! Culler API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use culler_application::RetentionSweepService;
use culler_core::AppError;
use culler_infrastructure::{CodeArtifactPackageCatalog, RedisRetentionTaskQueue};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Internal(format!("failed to create redis client: {error}")))?;
    let task_queue =
        RedisRetentionTaskQueue::connect(redis_client, config.queue_key.as_str()).await?;
    let catalog = CodeArtifactPackageCatalog::new(config.codeartifact_endpoint_url.clone());

    let app_state = AppState {
        retention_service: RetentionSweepService::new(
            Arc::new(catalog),
            Arc::new(task_queue),
            config.policy,
        ),
    };

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        queue_key = %config.queue_key,
        keep_latest = config.policy.keep_latest,
        dry_run = config.policy.dry_run,
        "culler-api listening"
    );

    axum::serve(listener, build_router(app_state))
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/retention/sweeps",
            post(handlers::retention::trigger_sweep_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
