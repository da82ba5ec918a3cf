use std::fmt::{Display, Formatter};

use culler_core::{AppError, AppResult, NonEmptyString};

const ARN_PREFIX: &str = "arn";
const CODEARTIFACT_SERVICE: &str = "codeartifact";
const REPOSITORY_RESOURCE_PREFIX: &str = "repository/";

/// Reference to one CodeArtifact repository, parsed from its ARN.
///
/// Accepted shape: `arn:<partition>:codeartifact:<region>:<account>:repository/<domain>/<repository>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    region: NonEmptyString,
    account_id: String,
    domain: NonEmptyString,
    repository: NonEmptyString,
}

impl RepositoryRef {
    /// Parses a repository ARN.
    pub fn parse(arn: &str) -> AppResult<Self> {
        let invalid = |reason: &str| {
            AppError::Validation(format!(
                "'{arn}' is not a CodeArtifact repository ARN: {reason}"
            ))
        };

        let mut parts = arn.splitn(6, ':');
        let (
            Some(prefix),
            Some(partition),
            Some(service),
            Some(region),
            Some(account_id),
            Some(resource),
        ) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        )
        else {
            return Err(invalid("expected six ':'-separated fields"));
        };

        if prefix != ARN_PREFIX {
            return Err(invalid("missing 'arn' prefix"));
        }

        if partition.is_empty() {
            return Err(invalid("partition must not be empty"));
        }

        if service != CODEARTIFACT_SERVICE {
            return Err(invalid("service must be 'codeartifact'"));
        }

        if account_id.is_empty() || !account_id.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid("account id must be numeric"));
        }

        let path = resource
            .strip_prefix(REPOSITORY_RESOURCE_PREFIX)
            .ok_or_else(|| invalid("resource must start with 'repository/'"))?;

        let mut segments = path.split('/');
        let (Some(domain), Some(repository), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid("resource must be 'repository/<domain>/<repository>'"));
        };

        Ok(Self {
            region: NonEmptyString::new(region).map_err(|_| invalid("region must not be empty"))?,
            account_id: account_id.to_owned(),
            domain: NonEmptyString::new(domain).map_err(|_| invalid("domain must not be empty"))?,
            repository: NonEmptyString::new(repository)
                .map_err(|_| invalid("repository must not be empty"))?,
        })
    }

    /// Returns the AWS region hosting the repository.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region.as_str()
    }

    /// Returns the owning account id.
    #[must_use]
    pub fn account_id(&self) -> &str {
        self.account_id.as_str()
    }

    /// Returns the CodeArtifact domain name.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.domain.as_str()
    }

    /// Returns the repository name.
    #[must_use]
    pub fn repository(&self) -> &str {
        self.repository.as_str()
    }
}

impl Display for RepositoryRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}/{} ({})",
            self.domain, self.repository, self.region
        )
    }
}
