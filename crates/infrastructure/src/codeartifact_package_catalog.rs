//! AWS CodeArtifact implementation of the package catalog port.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_codeartifact::Client;
use aws_sdk_codeartifact::error::DisplayErrorContext;
use aws_sdk_codeartifact::operation::delete_package_versions::DeletePackageVersionsOutput;
use aws_sdk_codeartifact::primitives::DateTime as SmithyDateTime;
use aws_sdk_codeartifact::types::{PackageFormat, PackageSummary, PackageVersionSortType};
use chrono::{DateTime, Utc};
use culler_application::{CatalogPageRequest, PackageCatalog, PackagePage, PackageVersionPage};
use culler_core::{AppError, AppResult};
use culler_domain::{
    DeleteVersionsOutcome, FailedPackageVersion, PackageDescriptor, PackageVersionDetail,
    PackageVersionSummary, RepositoryRef,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// CodeArtifact catalog adapter.
///
/// Each repository reference carries its own region, so one SDK client is built lazily per
/// region and reused for the rest of the process.
pub struct CodeArtifactPackageCatalog {
    endpoint_url: Option<String>,
    clients: RwLock<HashMap<String, Client>>,
}

impl CodeArtifactPackageCatalog {
    /// Creates a catalog adapter using the default AWS credential chain.
    #[must_use]
    pub fn new(endpoint_url: Option<String>) -> Self {
        Self {
            endpoint_url,
            clients: RwLock::new(HashMap::new()),
        }
    }

    async fn client_for(&self, region: &str) -> Client {
        if let Some(client) = self.clients.read().await.get(region) {
            return client.clone();
        }

        info!(region, "initializing CodeArtifact client");
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .load()
            .await;

        let mut config_builder = aws_sdk_codeartifact::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &self.endpoint_url {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(config_builder.build());

        self.clients
            .write()
            .await
            .entry(region.to_owned())
            .or_insert(client)
            .clone()
    }
}

#[async_trait]
impl PackageCatalog for CodeArtifactPackageCatalog {
    async fn list_packages(
        &self,
        repository: &RepositoryRef,
        page: CatalogPageRequest,
    ) -> AppResult<PackagePage> {
        let client = self.client_for(repository.region()).await;
        let output = client
            .list_packages()
            .domain(repository.domain())
            .repository(repository.repository())
            .max_results(page.page_size)
            .set_next_token(page.next_token)
            .send()
            .await
            .map_err(|error| catalog_error("ListPackages", repository, error))?;

        let packages = output
            .packages()
            .iter()
            .map(package_descriptor)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PackagePage {
            packages,
            next_token: output.next_token().map(str::to_owned),
        })
    }

    async fn list_package_versions(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
        page: CatalogPageRequest,
    ) -> AppResult<PackageVersionPage> {
        let client = self.client_for(repository.region()).await;
        let output = client
            .list_package_versions()
            .domain(repository.domain())
            .repository(repository.repository())
            .format(PackageFormat::from(package.format()))
            .set_namespace(package.namespace().map(str::to_owned))
            .package(package.name())
            .sort_by(PackageVersionSortType::PublishedTime)
            .max_results(page.page_size)
            .set_next_token(page.next_token)
            .send()
            .await
            .map_err(|error| catalog_error("ListPackageVersions", repository, error))?;

        Ok(PackageVersionPage {
            versions: output
                .versions()
                .iter()
                .map(|summary| PackageVersionSummary::new(summary.version()))
                .collect(),
            default_display_version: output.default_display_version().map(str::to_owned),
            next_token: output.next_token().map(str::to_owned),
        })
    }

    async fn describe_package_version(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
        version: &str,
    ) -> AppResult<PackageVersionDetail> {
        let client = self.client_for(repository.region()).await;
        let output = client
            .describe_package_version()
            .domain(repository.domain())
            .repository(repository.repository())
            .format(PackageFormat::from(package.format()))
            .set_namespace(package.namespace().map(str::to_owned))
            .package(package.name())
            .package_version(version)
            .send()
            .await
            .map_err(|error| catalog_error("DescribePackageVersion", repository, error))?;

        let published_time = output
            .package_version()
            .and_then(|description| description.published_time())
            .and_then(chrono_time);

        Ok(PackageVersionDetail {
            version: version.to_owned(),
            published_time,
        })
    }

    async fn delete_package_versions(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
        versions: &[String],
    ) -> AppResult<DeleteVersionsOutcome> {
        let client = self.client_for(repository.region()).await;
        let output = client
            .delete_package_versions()
            .domain(repository.domain())
            .repository(repository.repository())
            .format(PackageFormat::from(package.format()))
            .set_namespace(package.namespace().map(str::to_owned))
            .package(package.name())
            .set_versions(Some(versions.to_vec()))
            .send()
            .await
            .map_err(|error| catalog_error("DeletePackageVersions", repository, error))?;

        debug!(
            repository = %repository,
            package = %package,
            response = ?output,
            "DeletePackageVersions response"
        );

        Ok(delete_outcome(&output))
    }
}

fn catalog_error<E>(operation: &str, repository: &RepositoryRef, error: E) -> AppError
where
    E: std::error::Error,
{
    AppError::Catalog(format!(
        "{operation} failed for {repository}: {}",
        DisplayErrorContext(&error)
    ))
}

fn package_descriptor(summary: &PackageSummary) -> AppResult<PackageDescriptor> {
    let format = summary.format().map(PackageFormat::as_str).ok_or_else(|| {
        AppError::Catalog("package summary is missing its format".to_owned())
    })?;
    let name = summary
        .package()
        .ok_or_else(|| AppError::Catalog("package summary is missing its name".to_owned()))?;

    PackageDescriptor::new(format, name, summary.namespace().map(str::to_owned))
}

fn chrono_time(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
}

fn delete_outcome(output: &DeletePackageVersionsOutput) -> DeleteVersionsOutcome {
    let mut successful = output
        .successful_versions()
        .map(|versions| versions.keys().cloned().collect::<Vec<_>>())
        .unwrap_or_default();
    successful.sort();

    let mut failed = output
        .failed_versions()
        .map(|versions| {
            versions
                .iter()
                .map(|(version, error)| FailedPackageVersion {
                    version: version.clone(),
                    error_code: error.error_code().map(|code| code.as_str().to_owned()),
                    error_message: error.error_message().map(str::to_owned),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    failed.sort_by(|left, right| left.version.cmp(&right.version));

    DeleteVersionsOutcome { successful, failed }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aws_sdk_codeartifact::operation::delete_package_versions::DeletePackageVersionsOutput;
    use aws_sdk_codeartifact::primitives::DateTime as SmithyDateTime;
    use aws_sdk_codeartifact::types::{
        PackageFormat, PackageSummary, PackageVersionError, PackageVersionErrorCode,
        PackageVersionStatus, SuccessfulPackageVersionInfo,
    };
    use chrono::{TimeZone, Utc};

    use super::{chrono_time, delete_outcome, package_descriptor};

    #[test]
    fn package_summary_maps_to_descriptor() {
        let summary = PackageSummary::builder()
            .format(PackageFormat::Npm)
            .namespace("acme")
            .package("design-system")
            .build();

        let descriptor = package_descriptor(&summary);
        assert!(descriptor.is_ok());
        let descriptor = descriptor.unwrap_or_else(|_| unreachable!());
        assert_eq!(descriptor.format(), "npm");
        assert_eq!(descriptor.name(), "design-system");
        assert_eq!(descriptor.namespace(), Some("acme"));
    }

    #[test]
    fn package_summary_without_name_is_a_catalog_error() {
        let summary = PackageSummary::builder().format(PackageFormat::Pypi).build();
        assert!(package_descriptor(&summary).is_err());
    }

    #[test]
    fn smithy_timestamps_convert_to_utc() {
        let converted = chrono_time(&SmithyDateTime::from_secs(1_767_225_600));
        let expected = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single();
        assert_eq!(converted, expected);
    }

    #[test]
    fn delete_output_reports_successful_and_failed_versions() {
        let output = DeletePackageVersionsOutput::builder()
            .set_successful_versions(Some(HashMap::from([
                (
                    "2.0.0".to_owned(),
                    SuccessfulPackageVersionInfo::builder()
                        .status(PackageVersionStatus::Deleted)
                        .build(),
                ),
                (
                    "1.0.0".to_owned(),
                    SuccessfulPackageVersionInfo::builder()
                        .status(PackageVersionStatus::Deleted)
                        .build(),
                ),
            ])))
            .set_failed_versions(Some(HashMap::from([(
                "0.1.0".to_owned(),
                PackageVersionError::builder()
                    .error_code(PackageVersionErrorCode::MismatchedStatus)
                    .error_message("version is archived")
                    .build(),
            )])))
            .build();

        let outcome = delete_outcome(&output);
        assert_eq!(outcome.successful, vec!["1.0.0".to_owned(), "2.0.0".to_owned()]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].version, "0.1.0");
        assert_eq!(
            outcome.failed[0].error_code.as_deref(),
            Some("MISMATCHED_STATUS")
        );
        assert!(!outcome.failed.is_empty());
    }

    #[test]
    fn empty_delete_output_is_an_empty_outcome() {
        let outcome = delete_outcome(&DeletePackageVersionsOutput::builder().build());
        assert!(outcome.successful.is_empty());
        assert!(outcome.failed.is_empty());
    }
}
