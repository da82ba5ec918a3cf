use std::env;
use std::time::Duration;

use culler_application::RetentionPolicy;
use culler_core::{AppError, AppResult};
use culler_domain::{RepositoryRef, RetentionEvent};

/// How package tasks travel from the sweep to the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Bounded in-process channel drained by this worker's pool.
    Local,
    /// Redis list shared by every worker process.
    Redis,
}

impl DispatchMode {
    fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "invalid RETENTION_DISPATCH_MODE value '{other}', expected 'local' or 'redis'"
            ))),
        }
    }
}

/// Repository sweep configured through the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredSweep {
    pub repository_arn: String,
    pub days_to_retain: i64,
    /// Period between scheduled sweeps; `None` disables the schedule.
    pub interval: Option<Duration>,
}

impl ConfiguredSweep {
    pub fn event(&self) -> RetentionEvent {
        RetentionEvent::for_repository(self.repository_arn.as_str(), self.days_to_retain)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub policy: RetentionPolicy,
    pub dispatch_mode: DispatchMode,
    pub redis_url: Option<String>,
    pub queue_key: String,
    pub codeartifact_endpoint_url: Option<String>,
    pub max_concurrency: usize,
    pub queue_capacity: usize,
    pub queue_poll_interval: Duration,
    pub sweep: Option<ConfiguredSweep>,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let worker_id = env
            .optional("WORKER_ID")
            .unwrap_or_else(|| format!("worker-{}", std::process::id()));
        let policy = RetentionPolicy::from_lookup(&env.lookup)?;
        let dispatch_mode = env
            .optional("RETENTION_DISPATCH_MODE")
            .map(|value| DispatchMode::parse(value.as_str()))
            .transpose()?
            .unwrap_or(DispatchMode::Local);
        let redis_url = env.optional("REDIS_URL");
        let queue_key = env
            .optional("RETENTION_QUEUE_KEY")
            .unwrap_or_else(|| "culler:retention:tasks".to_owned());
        let codeartifact_endpoint_url = env.optional("CODEARTIFACT_ENDPOINT_URL");
        let max_concurrency = env.parse_usize("RETENTION_MAX_CONCURRENCY", 8)?;
        let queue_capacity = env.parse_usize("RETENTION_QUEUE_CAPACITY", 1024)?;
        let queue_poll_seconds = env.parse_u64("RETENTION_QUEUE_POLL_SECONDS", 5)?;

        if max_concurrency == 0 {
            return Err(AppError::Validation(
                "RETENTION_MAX_CONCURRENCY must be greater than zero".to_owned(),
            ));
        }

        if queue_capacity == 0 {
            return Err(AppError::Validation(
                "RETENTION_QUEUE_CAPACITY must be greater than zero".to_owned(),
            ));
        }

        if queue_poll_seconds == 0 {
            return Err(AppError::Validation(
                "RETENTION_QUEUE_POLL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if dispatch_mode == DispatchMode::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when RETENTION_DISPATCH_MODE is 'redis'".to_owned(),
            ));
        }

        let sweep = configured_sweep(&env)?;

        Ok(Self {
            worker_id,
            policy,
            dispatch_mode,
            redis_url,
            queue_key,
            codeartifact_endpoint_url,
            max_concurrency,
            queue_capacity,
            queue_poll_interval: Duration::from_secs(queue_poll_seconds),
            sweep,
        })
    }

    /// Returns the configured sweep or a validation error naming the missing variables.
    pub fn require_sweep(&self) -> AppResult<&ConfiguredSweep> {
        self.sweep.as_ref().ok_or_else(|| {
            AppError::Validation(
                "RETENTION_REPOSITORY_ARN and RETENTION_DAYS_TO_RETAIN are required".to_owned(),
            )
        })
    }
}

fn configured_sweep<F>(env: &EnvReader<F>) -> AppResult<Option<ConfiguredSweep>>
where
    F: Fn(&str) -> Option<String>,
{
    let repository_arn = env.optional("RETENTION_REPOSITORY_ARN");
    let days_to_retain = env.optional("RETENTION_DAYS_TO_RETAIN");
    let interval_seconds = env.parse_u64("RETENTION_SWEEP_INTERVAL_SECONDS", 0)?;

    let (repository_arn, days_to_retain) = match (repository_arn, days_to_retain) {
        (Some(repository_arn), Some(days_to_retain)) => (repository_arn, days_to_retain),
        (None, None) => {
            if interval_seconds > 0 {
                return Err(AppError::Validation(
                    "RETENTION_SWEEP_INTERVAL_SECONDS requires RETENTION_REPOSITORY_ARN and RETENTION_DAYS_TO_RETAIN"
                        .to_owned(),
                ));
            }
            return Ok(None);
        }
        _ => {
            return Err(AppError::Validation(
                "RETENTION_REPOSITORY_ARN and RETENTION_DAYS_TO_RETAIN must be set together"
                    .to_owned(),
            ));
        }
    };

    RepositoryRef::parse(repository_arn.as_str())?;
    let days_to_retain = days_to_retain.parse::<i64>().map_err(|error| {
        AppError::Validation(format!(
            "invalid RETENTION_DAYS_TO_RETAIN value '{days_to_retain}': {error}"
        ))
    })?;

    Ok(Some(ConfiguredSweep {
        repository_arn,
        days_to_retain,
        interval: (interval_seconds > 0).then(|| Duration::from_secs(interval_seconds)),
    }))
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn parse_usize(&self, name: &str, default: usize) -> AppResult<usize> {
        match self.optional(name) {
            Some(value) => value.parse::<usize>().map_err(|error| {
                AppError::Validation(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }

    fn parse_u64(&self, name: &str, default: u64) -> AppResult<u64> {
        match self.optional(name) {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use culler_core::AppError;

    use super::{DispatchMode, WorkerConfig};

    const ARN: &str = "arn:aws:codeartifact:eu-west-1:123456789012:repository/acme/releases";

    fn load(vars: &[(&str, &str)]) -> Result<WorkerConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        WorkerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap_or_else(|_| unreachable!());

        assert!(config.policy.keep_latest);
        assert!(!config.policy.dry_run);
        assert_eq!(config.dispatch_mode, DispatchMode::Local);
        assert_eq!(config.queue_key, "culler:retention:tasks");
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.queue_poll_interval, Duration::from_secs(5));
        assert!(config.worker_id.starts_with("worker-"));
        assert!(config.sweep.is_none());
        assert!(config.require_sweep().is_err());
    }

    #[test]
    fn keep_latest_can_be_disabled() {
        let config = load(&[("RETENTION_KEEP_LATEST", "false"), ("RETENTION_DRY_RUN", "1")])
            .unwrap_or_else(|_| unreachable!());

        assert!(!config.policy.keep_latest);
        assert!(config.policy.dry_run);
    }

    #[test]
    fn yes_and_no_flags_are_accepted() {
        let config = load(&[("RETENTION_KEEP_LATEST", "yes"), ("RETENTION_DRY_RUN", "No")])
            .unwrap_or_else(|_| unreachable!());

        assert!(config.policy.keep_latest);
        assert!(!config.policy.dry_run);
    }

    #[test]
    fn invalid_boolean_is_rejected() {
        let result = load(&[("RETENTION_KEEP_LATEST", "sometimes")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn redis_mode_requires_redis_url() {
        let result = load(&[("RETENTION_DISPATCH_MODE", "redis")]);
        assert!(matches!(result, Err(AppError::Validation(_))));

        let config = load(&[
            ("RETENTION_DISPATCH_MODE", "Redis"),
            ("REDIS_URL", "redis://127.0.0.1:6379"),
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.dispatch_mode, DispatchMode::Redis);
    }

    #[test]
    fn unknown_dispatch_mode_is_rejected() {
        let result = load(&[("RETENTION_DISPATCH_MODE", "sqs")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = load(&[("RETENTION_MAX_CONCURRENCY", "0")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn configured_sweep_builds_repository_event() {
        let config = load(&[
            ("RETENTION_REPOSITORY_ARN", ARN),
            ("RETENTION_DAYS_TO_RETAIN", "30"),
            ("RETENTION_SWEEP_INTERVAL_SECONDS", "3600"),
        ])
        .unwrap_or_else(|_| unreachable!());

        let sweep = config.require_sweep().unwrap_or_else(|_| unreachable!());
        assert_eq!(sweep.interval, Some(Duration::from_secs(3600)));

        let event = sweep.event();
        assert_eq!(event.repository_arn, ARN);
        assert_eq!(event.days_to_retain, 30);
        assert!(event.package.is_none());
        assert!(event.invocation_time.is_none());
    }

    #[test]
    fn sweep_without_interval_is_not_scheduled() {
        let config = load(&[
            ("RETENTION_REPOSITORY_ARN", ARN),
            ("RETENTION_DAYS_TO_RETAIN", "0"),
        ])
        .unwrap_or_else(|_| unreachable!());

        let sweep = config.require_sweep().unwrap_or_else(|_| unreachable!());
        assert_eq!(sweep.interval, None);
        assert_eq!(sweep.days_to_retain, 0);
    }

    #[test]
    fn sweep_variables_must_be_set_together() {
        let result = load(&[("RETENTION_REPOSITORY_ARN", ARN)]);
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = load(&[("RETENTION_SWEEP_INTERVAL_SECONDS", "60")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn malformed_repository_arn_fails_at_startup() {
        let result = load(&[
            ("RETENTION_REPOSITORY_ARN", "arn:aws:s3:::bucket"),
            ("RETENTION_DAYS_TO_RETAIN", "30"),
        ]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
