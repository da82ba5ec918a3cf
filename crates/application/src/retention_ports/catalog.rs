use async_trait::async_trait;
use culler_core::AppResult;
use culler_domain::{
    DeleteVersionsOutcome, PackageDescriptor, PackageVersionDetail, PackageVersionSummary,
    RepositoryRef,
};

/// Page size requested from every paginated catalog listing.
pub const CATALOG_PAGE_SIZE: i32 = 1000;

/// Parameters for one page of a paginated catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPageRequest {
    /// Maximum number of items in the page.
    pub page_size: i32,
    /// Continuation token returned by the previous page.
    pub next_token: Option<String>,
}

impl CatalogPageRequest {
    /// Request for the first page.
    #[must_use]
    pub fn first(page_size: i32) -> Self {
        Self {
            page_size,
            next_token: None,
        }
    }

    /// Request for the page following `next_token`.
    #[must_use]
    pub fn after(&self, next_token: String) -> Self {
        Self {
            page_size: self.page_size,
            next_token: Some(next_token),
        }
    }
}

/// One page of packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagePage {
    /// Packages in this page; empty when the catalog omitted them.
    pub packages: Vec<PackageDescriptor>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// One page of package versions sorted by publish time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageVersionPage {
    /// Versions in this page; empty when the catalog omitted them.
    pub versions: Vec<PackageVersionSummary>,
    /// Version the catalog designates as the package's default display version.
    pub default_display_version: Option<String>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// Port for the package registry holding the repositories being swept.
///
/// Every package-scoped call must forward the namespace only when
/// [`PackageDescriptor::namespace`] returns one.
#[async_trait]
pub trait PackageCatalog: Send + Sync {
    /// Lists one page of packages in the repository.
    async fn list_packages(
        &self,
        repository: &RepositoryRef,
        page: CatalogPageRequest,
    ) -> AppResult<PackagePage>;

    /// Lists one page of a package's versions, sorted by publish time.
    async fn list_package_versions(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
        page: CatalogPageRequest,
    ) -> AppResult<PackageVersionPage>;

    /// Describes one package version.
    async fn describe_package_version(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
        version: &str,
    ) -> AppResult<PackageVersionDetail>;

    /// Deletes a batch of versions of one package.
    async fn delete_package_versions(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
        versions: &[String],
    ) -> AppResult<DeleteVersionsOutcome>;
}
