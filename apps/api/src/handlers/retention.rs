use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use culler_application::SweepOutcome;
use culler_core::AppError;
use culler_domain::RetentionEvent;
use tracing::info;

use crate::dto::SweepResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Starts a repository sweep and returns once every package task has been queued.
pub async fn trigger_sweep_handler(
    State(state): State<AppState>,
    Json(payload): Json<RetentionEvent>,
) -> ApiResult<(StatusCode, Json<SweepResponse>)> {
    if payload.package.is_some() {
        return Err(AppError::Validation(
            "package retention tasks are internal and cannot be triggered over HTTP".to_owned(),
        )
        .into());
    }

    info!(
        repository_arn = %payload.repository_arn,
        days_to_retain = payload.days_to_retain,
        "retention sweep requested"
    );

    match state.retention_service.handle(payload).await? {
        SweepOutcome::Skipped => Ok((StatusCode::OK, Json(SweepResponse::skipped()))),
        SweepOutcome::Dispatched(report) => {
            Ok((StatusCode::ACCEPTED, Json(SweepResponse::from(report))))
        }
        SweepOutcome::Processed(_) => Err(AppError::Internal(
            "repository sweep returned a package result".to_owned(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::Json;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use culler_application::{
        CatalogPageRequest, PackageCatalog, PackagePage, PackageVersionPage, RetentionPolicy,
        RetentionSweepService, RetentionTaskDispatcher,
    };
    use culler_core::{AppError, AppResult};
    use culler_domain::{
        DeleteVersionsOutcome, PackageDescriptor, PackageVersionDetail, RepositoryRef,
        RetentionEvent,
    };
    use tokio::sync::Mutex;

    use super::trigger_sweep_handler;
    use crate::state::AppState;

    const ARN: &str = "arn:aws:codeartifact:us-east-1:123456789012:repository/acme/releases";

    struct FakePackageCatalog {
        packages: Vec<PackageDescriptor>,
    }

    #[async_trait]
    impl PackageCatalog for FakePackageCatalog {
        async fn list_packages(
            &self,
            _repository: &RepositoryRef,
            _page: CatalogPageRequest,
        ) -> AppResult<PackagePage> {
            Ok(PackagePage {
                packages: self.packages.clone(),
                next_token: None,
            })
        }

        async fn list_package_versions(
            &self,
            _repository: &RepositoryRef,
            _package: &PackageDescriptor,
            _page: CatalogPageRequest,
        ) -> AppResult<PackageVersionPage> {
            Err(AppError::Internal(
                "versions are never listed by a repository sweep".to_owned(),
            ))
        }

        async fn describe_package_version(
            &self,
            _repository: &RepositoryRef,
            _package: &PackageDescriptor,
            _version: &str,
        ) -> AppResult<PackageVersionDetail> {
            Err(AppError::Internal(
                "versions are never described by a repository sweep".to_owned(),
            ))
        }

        async fn delete_package_versions(
            &self,
            _repository: &RepositoryRef,
            _package: &PackageDescriptor,
            _versions: &[String],
        ) -> AppResult<DeleteVersionsOutcome> {
            Err(AppError::Internal(
                "versions are never deleted by a repository sweep".to_owned(),
            ))
        }
    }

    #[derive(Default)]
    struct FakeTaskDispatcher {
        tasks: Mutex<Vec<RetentionEvent>>,
        unavailable: bool,
    }

    #[async_trait]
    impl RetentionTaskDispatcher for FakeTaskDispatcher {
        async fn dispatch(&self, task: RetentionEvent) -> AppResult<()> {
            if self.unavailable {
                return Err(AppError::Dispatch("queue unavailable".to_owned()));
            }

            self.tasks.lock().await.push(task);
            Ok(())
        }
    }

    fn packages() -> Vec<PackageDescriptor> {
        ["left-pad", "right-pad"]
            .into_iter()
            .map(|name| {
                PackageDescriptor::new("npm", name, None).unwrap_or_else(|_| unreachable!())
            })
            .collect()
    }

    fn state_with(dispatcher: Arc<FakeTaskDispatcher>) -> AppState {
        AppState {
            retention_service: RetentionSweepService::new(
                Arc::new(FakePackageCatalog {
                    packages: packages(),
                }),
                dispatcher,
                RetentionPolicy::default(),
            ),
        }
    }

    fn payload(json: &str) -> RetentionEvent {
        serde_json::from_str(json).unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn repository_sweep_is_accepted_and_dispatched() {
        let dispatcher = Arc::new(FakeTaskDispatcher::default());
        let state = state_with(dispatcher.clone());

        let result = trigger_sweep_handler(
            State(state),
            Json(payload(&format!(
                r#"{{"repository_arn":"{ARN}","days_to_retain":30}}"#
            ))),
        )
        .await;

        let (status, Json(response)) = result.unwrap_or_else(|_| unreachable!());
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(response.status, "dispatched");
        assert_eq!(response.packages_dispatched, Some(2));

        let tasks = dispatcher.tasks.lock().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].sweep_id, response.sweep_id);
        assert_eq!(tasks[0].invocation_time, response.invocation_time);

        let body = serde_json::to_value(&response).unwrap_or_default();
        assert_eq!(body["status"], "dispatched");
        assert_eq!(body["packages_dispatched"], 2);
        assert!(body["sweep_id"].is_string());
    }

    #[tokio::test]
    async fn non_positive_window_is_skipped() {
        let dispatcher = Arc::new(FakeTaskDispatcher::default());
        let state = state_with(dispatcher.clone());

        let result = trigger_sweep_handler(
            State(state),
            Json(payload(&format!(
                r#"{{"repository_arn":"{ARN}","days_to_retain":0}}"#
            ))),
        )
        .await;

        let (status, Json(response)) = result.unwrap_or_else(|_| unreachable!());
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::to_value(&response).unwrap_or_default(),
            serde_json::json!({ "status": "skipped" })
        );
        assert!(dispatcher.tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn package_payload_is_rejected() {
        let dispatcher = Arc::new(FakeTaskDispatcher::default());
        let state = state_with(dispatcher.clone());

        let result = trigger_sweep_handler(
            State(state),
            Json(payload(&format!(
                r#"{{"repository_arn":"{ARN}","days_to_retain":30,"package":{{"format":"npm","package":"left-pad"}},"invocation_time":"2026-05-04T03:02:01Z"}}"#
            ))),
        )
        .await;

        let error = result.err().unwrap_or_else(|| unreachable!());
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(dispatcher.tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_repository_arn_is_a_bad_request() {
        let state = state_with(Arc::new(FakeTaskDispatcher::default()));

        let result = trigger_sweep_handler(
            State(state),
            Json(payload(
                r#"{"repository_arn":"arn:aws:s3:::bucket","days_to_retain":30}"#,
            )),
        )
        .await;

        let error = result.err().unwrap_or_else(|| unreachable!());
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unavailable_queue_is_reported() {
        let state = state_with(Arc::new(FakeTaskDispatcher {
            unavailable: true,
            ..FakeTaskDispatcher::default()
        }));

        let result = trigger_sweep_handler(
            State(state),
            Json(payload(&format!(
                r#"{{"repository_arn":"{ARN}","days_to_retain":30}}"#
            ))),
        )
        .await;

        let error = result.err().unwrap_or_else(|| unreachable!());
        assert_eq!(
            error.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
