use super::*;

impl RetentionSweepService {
    /// Lists every package in the repository, following continuation tokens.
    pub async fn list_all_packages(
        &self,
        repository: &RepositoryRef,
    ) -> AppResult<Vec<PackageDescriptor>> {
        let mut page = CatalogPageRequest::first(CATALOG_PAGE_SIZE);
        let mut packages = Vec::new();

        loop {
            debug!(repository = %repository, "fetching packages");
            let response = self.catalog.list_packages(repository, page.clone()).await?;
            packages.extend(response.packages);

            match response.next_token {
                Some(next_token) => page = page.after(next_token),
                None => break,
            }
        }

        info!(
            repository = %repository,
            package_count = packages.len(),
            "fetched packages"
        );

        Ok(packages)
    }

    /// Lists every version of a package in catalog order, following continuation tokens.
    pub async fn list_all_versions(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
    ) -> AppResult<PackageVersionListing> {
        let mut page = CatalogPageRequest::first(CATALOG_PAGE_SIZE);
        let mut listing = PackageVersionListing::default();

        loop {
            debug!(repository = %repository, package = %package, "fetching versions");
            let response = self
                .catalog
                .list_package_versions(repository, package, page.clone())
                .await?;

            if response.default_display_version.is_some() {
                listing.default_display_version = response.default_display_version;
            }
            listing.versions.extend(response.versions);

            match response.next_token {
                Some(next_token) => page = page.after(next_token),
                None => break,
            }
        }

        info!(
            repository = %repository,
            package = %package,
            version_count = listing.versions.len(),
            default_display_version = listing.default_display_version.as_deref(),
            "fetched versions"
        );

        Ok(listing)
    }
}
