use super::*;

impl RetentionSweepService {
    /// Fans a repository-level event out into one package task per package.
    ///
    /// `invocation_time` is captured once by the caller and stamped unchanged on every task so
    /// all packages of the sweep share one age cutoff.
    pub(super) async fn sweep_repository(
        &self,
        event: &RetentionEvent,
        repository: &RepositoryRef,
        invocation_time: DateTime<Utc>,
    ) -> AppResult<RepositorySweepReport> {
        let sweep_id = Uuid::new_v4();
        info!(
            %sweep_id,
            repository = %repository,
            account_id = repository.account_id(),
            days_to_retain = event.days_to_retain,
            %invocation_time,
            keep_latest = self.policy.keep_latest,
            dry_run = self.policy.dry_run,
            "starting repository retention sweep"
        );

        let packages = self.list_all_packages(repository).await?;
        let mut packages_dispatched = 0_usize;

        for package in packages {
            debug!(%sweep_id, package = %package, "dispatching package retention task");
            self.dispatcher
                .dispatch(event.for_package(package, invocation_time, sweep_id))
                .await?;
            packages_dispatched += 1;
        }

        info!(
            %sweep_id,
            repository = %repository,
            packages_dispatched,
            "repository retention sweep dispatched"
        );

        Ok(RepositorySweepReport {
            sweep_id,
            invocation_time,
            packages_dispatched,
        })
    }
}
