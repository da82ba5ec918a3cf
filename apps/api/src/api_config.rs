use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use culler_application::RetentionPolicy;
use culler_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub redis_url: String,
    pub queue_key: String,
    pub codeartifact_endpoint_url: Option<String>,
    pub policy: RetentionPolicy,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let dispatch_mode =
            optional("RETENTION_DISPATCH_MODE").unwrap_or_else(|| "redis".to_owned());
        if !dispatch_mode.eq_ignore_ascii_case("redis") {
            return Err(AppError::Validation(format!(
                "culler-api only supports RETENTION_DISPATCH_MODE 'redis', got '{dispatch_mode}'"
            )));
        }

        let redis_url = optional("REDIS_URL")
            .ok_or_else(|| AppError::Validation("REDIS_URL is required".to_owned()))?;
        let queue_key =
            optional("RETENTION_QUEUE_KEY").unwrap_or_else(|| "culler:retention:tasks".to_owned());
        let codeartifact_endpoint_url = optional("CODEARTIFACT_ENDPOINT_URL");

        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = match optional("API_PORT") {
            Some(value) => value.parse::<u16>().map_err(|error| {
                AppError::Validation(format!("invalid API_PORT value '{value}': {error}"))
            })?,
            None => 3001,
        };

        let policy = RetentionPolicy::from_lookup(&lookup)?;

        Ok(Self {
            api_host,
            api_port,
            redis_url,
            queue_key,
            codeartifact_endpoint_url,
            policy,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
