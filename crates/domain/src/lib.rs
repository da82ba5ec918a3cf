//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod event;
mod package;
mod repository;
mod retention;
mod version;

pub use event::{RetentionEvent, RetentionScope};
pub use package::PackageDescriptor;
pub use repository::RepositoryRef;
pub use retention::RetentionWindow;
pub use version::{
    DeleteVersionsOutcome, FailedPackageVersion, PackageVersionDetail, PackageVersionSummary,
};
