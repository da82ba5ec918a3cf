use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a package version listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionSummary {
    /// Version identifier.
    pub version: String,
}

impl PackageVersionSummary {
    /// Creates a version summary.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

/// Detailed description of one package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionDetail {
    /// Version identifier.
    pub version: String,
    /// Authoritative publish timestamp. Absent when the catalog does not report one.
    pub published_time: Option<DateTime<Utc>>,
}

/// Version the catalog could not delete, with the reason it reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPackageVersion {
    /// Version identifier.
    pub version: String,
    /// Catalog error code, e.g. `MISMATCHED_STATUS`.
    pub error_code: Option<String>,
    /// Human readable catalog error message.
    pub error_message: Option<String>,
}

/// Result of one batched version delete as reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteVersionsOutcome {
    /// Versions the catalog deleted.
    pub successful: Vec<String>,
    /// Versions the catalog reported as failed.
    pub failed: Vec<FailedPackageVersion>,
}
