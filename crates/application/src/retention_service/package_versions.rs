use super::*;

impl RetentionSweepService {
    /// Evaluates every version of one package and batch-deletes the expired ones.
    pub async fn process_package_versions(
        &self,
        repository: &RepositoryRef,
        package: &PackageDescriptor,
        window: RetentionWindow,
        invocation_time: DateTime<Utc>,
    ) -> AppResult<PackageSweepReport> {
        let listing = self.list_all_versions(repository, package).await?;
        let latest_version = listing.default_display_version.as_deref();
        let mut report = PackageSweepReport {
            versions_listed: listing.versions.len(),
            dry_run: self.policy.dry_run,
            ..PackageSweepReport::default()
        };

        for summary in &listing.versions {
            let version = summary.version.as_str();

            if self.policy.keep_latest && latest_version == Some(version) {
                debug!(package = %package, version, "keeping latest version");
                report.skipped_latest = Some(version.to_owned());
                continue;
            }

            let detail = self
                .catalog
                .describe_package_version(repository, package, version)
                .await?;

            let Some(published_time) = detail.published_time else {
                warn!(
                    package = %package,
                    version,
                    "package version has no publish time, retaining it"
                );
                report.versions_without_publish_time += 1;
                continue;
            };

            debug!(
                package = %package,
                version,
                age_days = invocation_time
                    .signed_duration_since(published_time)
                    .num_days(),
                "package version age"
            );

            if window.is_expired(published_time, invocation_time) {
                report.versions_eligible.push(version.to_owned());
            } else {
                report.versions_retained += 1;
            }
        }

        if report.versions_eligible.is_empty() {
            info!(
                repository = %repository,
                package = %package,
                versions_listed = report.versions_listed,
                days_to_retain = window.days(),
                "no package versions older than the retention window"
            );
            return Ok(report);
        }

        if self.policy.dry_run {
            info!(
                repository = %repository,
                package = %package,
                versions = ?report.versions_eligible,
                days_to_retain = window.days(),
                "DRY RUN: would delete package versions"
            );
            return Ok(report);
        }

        info!(
            repository = %repository,
            package = %package,
            versions = ?report.versions_eligible,
            days_to_retain = window.days(),
            "deleting package versions"
        );
        let outcome = self
            .catalog
            .delete_package_versions(repository, package, &report.versions_eligible)
            .await?;

        for failed in &outcome.failed {
            warn!(
                repository = %repository,
                package = %package,
                version = %failed.version,
                error_code = failed.error_code.as_deref(),
                error_message = failed.error_message.as_deref(),
                "catalog failed to delete package version"
            );
        }

        info!(
            repository = %repository,
            package = %package,
            deleted = outcome.successful.len(),
            failed = outcome.failed.len(),
            "package versions delete completed"
        );

        report.versions_deleted = outcome.successful.len();
        report.versions_failed = outcome.failed;

        Ok(report)
    }
}
