mod catalog;
mod dispatcher;

pub use catalog::{
    CATALOG_PAGE_SIZE, CatalogPageRequest, PackageCatalog, PackagePage, PackageVersionPage,
};
pub use dispatcher::{PolledTask, RetentionTaskDispatcher, RetentionTaskSource};
