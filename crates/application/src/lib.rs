//! Application services and ports.

#![forbid(unsafe_code)]

mod retention_ports;
mod retention_service;

pub use retention_ports::{
    CATALOG_PAGE_SIZE, CatalogPageRequest, PackageCatalog, PackagePage, PackageVersionPage,
    PolledTask, RetentionTaskDispatcher, RetentionTaskSource,
};
pub use retention_service::{
    PackageSweepReport, PackageVersionListing, RepositorySweepReport, RetentionPolicy,
    RetentionSweepService, SweepOutcome,
};
