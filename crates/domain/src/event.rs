use chrono::{DateTime, Utc};
use culler_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PackageDescriptor, RepositoryRef, RetentionWindow};

/// Retention trigger payload.
///
/// The repository-level trigger carries only `repository_arn` and `days_to_retain`. Every
/// package task fanned out from it additionally carries `package`, the sweep's fixed
/// `invocation_time`, and the `sweep_id` used to correlate logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionEvent {
    /// Repository ARN.
    pub repository_arn: String,
    /// Retention window in days; non-positive values turn the event into a no-op.
    pub days_to_retain: i64,
    /// Target package for package-level tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageDescriptor>,
    /// Reference "now" shared by every task of one sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_time: Option<DateTime<Utc>>,
    /// Correlation id shared by every task of one sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep_id: Option<Uuid>,
}

/// Resolved target of one retention event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionScope {
    /// Enumerate every package of the repository and fan out one task per package.
    Repository {
        /// Target repository.
        repository: RepositoryRef,
    },
    /// Evaluate and delete the versions of one package.
    Package {
        /// Target repository.
        repository: RepositoryRef,
        /// Target package.
        package: PackageDescriptor,
        /// Reference time fixed by the originating sweep.
        invocation_time: DateTime<Utc>,
    },
}

impl RetentionEvent {
    /// Creates a repository-level trigger.
    #[must_use]
    pub fn for_repository(repository_arn: impl Into<String>, days_to_retain: i64) -> Self {
        Self {
            repository_arn: repository_arn.into(),
            days_to_retain,
            package: None,
            invocation_time: None,
            sweep_id: None,
        }
    }

    /// Derives the package task for one package of this sweep.
    #[must_use]
    pub fn for_package(
        &self,
        package: PackageDescriptor,
        invocation_time: DateTime<Utc>,
        sweep_id: Uuid,
    ) -> Self {
        Self {
            package: Some(package),
            invocation_time: Some(invocation_time),
            sweep_id: Some(sweep_id),
            ..self.clone()
        }
    }

    /// Returns the retention window, or `None` when `days_to_retain` is not positive.
    #[must_use]
    pub fn retention_window(&self) -> Option<RetentionWindow> {
        RetentionWindow::from_days(self.days_to_retain)
    }

    /// Parses the repository reference and resolves the event scope.
    pub fn scope(&self) -> AppResult<RetentionScope> {
        let repository = RepositoryRef::parse(self.repository_arn.as_str())?;

        match (&self.package, self.invocation_time) {
            (None, _) => Ok(RetentionScope::Repository { repository }),
            (Some(package), Some(invocation_time)) => Ok(RetentionScope::Package {
                repository,
                package: package.clone(),
                invocation_time,
            }),
            (Some(package), None) => Err(AppError::Validation(format!(
                "package task for '{package}' is missing invocation_time"
            ))),
        }
    }
}
