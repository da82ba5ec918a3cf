use std::sync::Arc;

use chrono::{DateTime, Utc};
use culler_core::{AppError, AppResult};
use culler_domain::{
    FailedPackageVersion, PackageDescriptor, PackageVersionSummary, RepositoryRef, RetentionEvent,
    RetentionScope, RetentionWindow,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::retention_ports::{
    CATALOG_PAGE_SIZE, CatalogPageRequest, PackageCatalog, RetentionTaskDispatcher,
};

mod package_versions;
mod pagination;
mod sweep;

/// Process-wide retention policy switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Never evaluate or delete a package's default display version.
    pub keep_latest: bool,
    /// Evaluate versions and log what would be deleted without deleting.
    pub dry_run: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_latest: true,
            dry_run: false,
        }
    }
}

impl RetentionPolicy {
    /// Reads `RETENTION_KEEP_LATEST` and `RETENTION_DRY_RUN` through `lookup`.
    ///
    /// Unset or blank variables keep the defaults. Flags accept `true`/`false`, `1`/`0` and
    /// `yes`/`no`, case-insensitively.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            keep_latest: parse_flag(
                "RETENTION_KEEP_LATEST",
                lookup("RETENTION_KEEP_LATEST").as_deref(),
                defaults.keep_latest,
            )?,
            dry_run: parse_flag(
                "RETENTION_DRY_RUN",
                lookup("RETENTION_DRY_RUN").as_deref(),
                defaults.dry_run,
            )?,
        })
    }
}

fn parse_flag(name: &str, value: Option<&str>, default: bool) -> AppResult<bool> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid {name} value '{value}': expected true or false"
        ))),
    }
}

/// Result of handling one retention event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The retention window was not positive; nothing was done.
    Skipped,
    /// A repository sweep submitted one task per package.
    Dispatched(RepositorySweepReport),
    /// A package task evaluated and deleted versions.
    Processed(PackageSweepReport),
}

/// Summary of one repository-level sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySweepReport {
    /// Correlation id stamped on every submitted task.
    pub sweep_id: Uuid,
    /// Reference time stamped on every submitted task.
    pub invocation_time: DateTime<Utc>,
    /// Number of package tasks submitted.
    pub packages_dispatched: usize,
}

/// Summary of one package-level task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSweepReport {
    /// Versions returned by the listing.
    pub versions_listed: usize,
    /// Default display version skipped because of the keep-latest policy.
    pub skipped_latest: Option<String>,
    /// Versions still inside the retention window.
    pub versions_retained: usize,
    /// Versions the catalog described without a publish time.
    pub versions_without_publish_time: usize,
    /// Versions older than the retention window.
    pub versions_eligible: Vec<String>,
    /// Versions the catalog reported as deleted.
    pub versions_deleted: usize,
    /// Versions the catalog failed to delete.
    pub versions_failed: Vec<FailedPackageVersion>,
    /// Whether deletion was suppressed by dry-run mode.
    pub dry_run: bool,
}

/// Full version listing of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageVersionListing {
    /// Versions in catalog order.
    pub versions: Vec<PackageVersionSummary>,
    /// Default display version, when the catalog reports one.
    pub default_display_version: Option<String>,
}

/// Retention sweep orchestrator.
///
/// A repository-level event enumerates packages and submits one task per package through
/// the dispatcher; a package-level event evaluates that package's versions and deletes the
/// expired ones.
#[derive(Clone)]
pub struct RetentionSweepService {
    catalog: Arc<dyn PackageCatalog>,
    dispatcher: Arc<dyn RetentionTaskDispatcher>,
    policy: RetentionPolicy,
}

impl RetentionSweepService {
    /// Creates a retention sweep service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn PackageCatalog>,
        dispatcher: Arc<dyn RetentionTaskDispatcher>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            catalog,
            dispatcher,
            policy,
        }
    }

    /// Handles one retention event.
    pub async fn handle(&self, event: RetentionEvent) -> AppResult<SweepOutcome> {
        let scope = event.scope()?;

        let Some(window) = event.retention_window() else {
            warn!(
                repository_arn = %event.repository_arn,
                days_to_retain = event.days_to_retain,
                "days_to_retain must be a positive number, skipping retention"
            );
            return Ok(SweepOutcome::Skipped);
        };

        match scope {
            RetentionScope::Repository { repository } => {
                if event.invocation_time.is_some() {
                    debug!(
                        repository = %repository,
                        "ignoring invocation_time on repository-level event"
                    );
                }

                self.sweep_repository(&event, &repository, Utc::now())
                    .await
                    .map(SweepOutcome::Dispatched)
            }
            RetentionScope::Package {
                repository,
                package,
                invocation_time,
            } => self
                .process_package_versions(&repository, &package, window, invocation_time)
                .await
                .map(SweepOutcome::Processed),
        }
    }
}
