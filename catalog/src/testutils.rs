//! In-memory catalog used by tests across the workspace.

use crate::store::{CatalogError, CatalogStore};
use crate::types::{DomainKind, DomainMapping, SubscriptionRecord, WorkspaceRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub struct StaticCatalog {
    workspaces: Vec<WorkspaceRecord>,
    domains: Vec<DomainMapping>,
    subscriptions: HashMap<String, SubscriptionRecord>,
    unavailable: AtomicBool,
    slug_lookups: AtomicUsize,
    domain_lookups: AtomicUsize,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, workspace: WorkspaceRecord) -> Self {
        self.workspaces.push(workspace);
        self
    }

    pub fn with_domain(mut self, mapping: DomainMapping) -> Self {
        self.domains.push(mapping);
        self
    }

    pub fn with_subscription(mut self, subscription: SubscriptionRecord) -> Self {
        self.subscriptions
            .insert(subscription.workspace_id.clone(), subscription);
        self
    }

    /// Makes every subsequent lookup fail, simulating a catalog outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn slug_lookups(&self) -> usize {
        self.slug_lookups.load(Ordering::SeqCst)
    }

    pub fn domain_lookups(&self) -> usize {
        self.domain_lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("catalog offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for StaticCatalog {
    async fn workspace_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<WorkspaceRecord>, CatalogError> {
        self.slug_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.workspaces.iter().find(|w| w.slug == slug).cloned())
    }

    async fn workspace_by_custom_domain(
        &self,
        host: &str,
    ) -> Result<Option<WorkspaceRecord>, CatalogError> {
        self.domain_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let Some(mapping) = self
            .domains
            .iter()
            .find(|d| d.host == host && d.kind == DomainKind::Custom && d.verified)
        else {
            return Ok(None);
        };

        Ok(self
            .workspaces
            .iter()
            .find(|w| w.id == mapping.workspace_id)
            .cloned())
    }

    async fn subscription(
        &self,
        workspace_id: &str,
    ) -> Result<Option<SubscriptionRecord>, CatalogError> {
        self.check_available()?;
        Ok(self.subscriptions.get(workspace_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MigrationStatus;

    fn workspace(id: &str, slug: &str) -> WorkspaceRecord {
        WorkspaceRecord {
            id: id.into(),
            slug: slug.into(),
            migration_status: MigrationStatus::Completed,
            encrypted_connection_string: Some("enc:pg://acme".into()),
            owner_email: None,
        }
    }

    #[tokio::test]
    async fn unverified_domains_do_not_resolve() {
        let catalog = StaticCatalog::new()
            .with_workspace(workspace("ws_1", "acme"))
            .with_domain(DomainMapping {
                host: "feedback.acme.com".into(),
                kind: DomainKind::Custom,
                verified: false,
                workspace_id: "ws_1".into(),
            });

        let found = catalog
            .workspace_by_custom_domain("feedback.acme.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn internal_mappings_do_not_resolve() {
        let catalog = StaticCatalog::new()
            .with_workspace(workspace("ws_1", "acme"))
            .with_domain(DomainMapping {
                host: "preview.acme.com".into(),
                kind: DomainKind::Internal,
                verified: true,
                workspace_id: "ws_1".into(),
            });

        let found = catalog
            .workspace_by_custom_domain("preview.acme.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn outage_surfaces_as_error_not_miss() {
        let catalog = StaticCatalog::new().with_workspace(workspace("ws_1", "acme"));
        catalog.set_unavailable(true);

        assert!(catalog.workspace_by_slug("acme").await.is_err());
    }
}
