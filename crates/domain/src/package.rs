use std::fmt::{Display, Formatter};

use culler_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Identifies one package inside a repository.
///
/// Serialized with the catalog's own field names so a package summary taken from a listing
/// can be forwarded unchanged inside a task payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageDescriptor {
    format: NonEmptyString,
    #[serde(rename = "package")]
    name: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

impl PackageDescriptor {
    /// Creates a validated package descriptor.
    pub fn new(
        format: impl Into<String>,
        name: impl Into<String>,
        namespace: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            format: NonEmptyString::new(format)?,
            name: NonEmptyString::new(name)?,
            namespace,
        })
    }

    /// Returns the package format, e.g. `npm` or `maven`.
    #[must_use]
    pub fn format(&self) -> &str {
        self.format.as_str()
    }

    /// Returns the package name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the namespace only when it is present and non-empty.
    ///
    /// An empty namespace is not the same request as an omitted one, so callers building
    /// catalog requests must go through this accessor.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .filter(|namespace| !namespace.is_empty())
    }
}

impl Display for PackageDescriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.namespace() {
            Some(namespace) => write!(formatter, "{}:{namespace}/{}", self.format, self.name),
            None => write!(formatter, "{}:{}", self.format, self.name),
        }
    }
}
