use crate::types::{SubscriptionRecord, WorkspaceRecord};
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("catalog query failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed catalog row: {0}")]
    Malformed(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the workspace registry.
///
/// Lookups return `Ok(None)` for the routine "no such workspace" case;
/// `Err` is reserved for infrastructure failures. Callers rely on that
/// split to decide between a quiet miss and an error log.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn workspace_by_slug(&self, slug: &str)
    -> Result<Option<WorkspaceRecord>, CatalogError>;

    /// Resolves a custom domain to its workspace. Only mappings of kind
    /// `custom` that have completed verification may resolve; the filter
    /// belongs to the implementation, not the caller.
    async fn workspace_by_custom_domain(
        &self,
        host: &str,
    ) -> Result<Option<WorkspaceRecord>, CatalogError>;

    async fn subscription(
        &self,
        workspace_id: &str,
    ) -> Result<Option<SubscriptionRecord>, CatalogError>;
}
