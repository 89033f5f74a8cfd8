pub mod postgres;
pub mod store;
pub mod testutils;
pub mod types;

pub use postgres::PgCatalog;
pub use store::{CatalogError, CatalogStore};
pub use types::{DomainKind, DomainMapping, MigrationStatus, SubscriptionRecord, WorkspaceRecord};
