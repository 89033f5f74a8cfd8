//! Maps an inbound request host to a ready-to-use tenant context.
//!
//! The public entry point never fails: misconfiguration, catalog outages,
//! unknown hosts, and half-provisioned workspaces all degrade to "no
//! tenant" so the request pipeline can render its not-found page without
//! special cases. The slug-based accessor for internal tooling takes the
//! opposite stance and reports exactly what went wrong.

use crate::config::TenancyConfig;
use crate::connection_cache::{CacheError, ConnectionCache};
use crate::connector::{Connector, WorkspaceSettings};
use crate::host::{HostLookup, classify_host, host_from_headers};
use crate::metrics_defs::{
    RESOLVER_ERROR, RESOLVER_NOT_READY, RESOLVER_RESOLVED, RESOLVER_UNKNOWN_HOST,
};
use crate::negative_cache::NegativeCache;
use catalog::store::{CatalogError, CatalogStore};
use catalog::types::MigrationStatus;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use shared::counter;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("base domain is not configured")]
    MissingBaseDomain,
    #[error("no workspace found for slug {0:?}")]
    UnknownWorkspace(String),
    #[error("workspace {workspace_id} is not ready for traffic (migration status: {status:?})")]
    NotReady {
        workspace_id: String,
        status: MigrationStatus,
    },
    #[error("workspace {0} has no connection string configured")]
    MissingConnectionString(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("settings fetch failed: {0}")]
    Settings(#[source] crate::connector::ConnectorError),
}

/// Billing context attached to a resolved tenant. Absence is a valid state
/// (self-hosted installs, workspaces not yet billed).
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionContext {
    pub tier: String,
    pub status: String,
    pub total_seats: i32,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Everything a request handler needs to serve one tenant. Rebuilt per
/// resolution; only the underlying handle and catalog rows are cached.
#[derive(Clone, Debug)]
pub struct TenantContext<H> {
    pub workspace_id: String,
    pub slug: String,
    pub db: H,
    pub settings: Option<WorkspaceSettings>,
    pub subscription: Option<SubscriptionContext>,
}

pub struct TenantResolver<C: Connector> {
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<ConnectionCache<C>>,
    base_domain: String,
    negative_cache: Option<NegativeCache>,
}

impl<C: Connector> TenantResolver<C> {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<ConnectionCache<C>>,
        config: &TenancyConfig,
    ) -> Self {
        TenantResolver {
            catalog,
            cache,
            base_domain: config.base_domain.trim().to_ascii_lowercase(),
            negative_cache: config.negative_cache.then(NegativeCache::new),
        }
    }

    /// Resolves the tenant for an inbound request, or `None` if no tenant
    /// applies. This is the error boundary for the public path: nothing
    /// below it reaches the request pipeline as an error.
    pub async fn resolve_tenant_from_domain(
        &self,
        headers: &HeaderMap,
    ) -> Option<TenantContext<C::Handle>> {
        match self.try_resolve(headers).await {
            Ok(Some(context)) => {
                counter!(RESOLVER_RESOLVED).increment(1);
                Some(context)
            }
            Ok(None) => None,
            Err(err) => {
                error!(error = %err, "tenant resolution failed");
                counter!(RESOLVER_ERROR).increment(1);
                None
            }
        }
    }

    async fn try_resolve(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<TenantContext<C::Handle>>, ResolveError> {
        if self.base_domain.is_empty() {
            // Deployment problem, not a per-request condition; still fails
            // closed like an unknown host.
            return Err(ResolveError::MissingBaseDomain);
        }

        let Some(host) = host_from_headers(headers) else {
            return Ok(None);
        };

        if let Some(negative) = &self.negative_cache
            && negative.recently_not_found(&host)
        {
            counter!(RESOLVER_UNKNOWN_HOST).increment(1);
            return Ok(None);
        }

        let workspace = match classify_host(&host, &self.base_domain) {
            HostLookup::BySlug(slug) => self.catalog.workspace_by_slug(&slug).await?,
            HostLookup::ByCustomDomain(domain) => {
                self.catalog.workspace_by_custom_domain(&domain).await?
            }
        };

        let Some(workspace) = workspace else {
            // Definitive not-found. Catalog errors took the `?` above and
            // are never remembered.
            if let Some(negative) = &self.negative_cache {
                negative.mark_not_found(&host);
            }
            counter!(RESOLVER_UNKNOWN_HOST).increment(1);
            return Ok(None);
        };

        if workspace.migration_status != MigrationStatus::Completed {
            debug!(
                workspace_id = %workspace.id,
                status = workspace.migration_status.as_str(),
                "workspace is not ready for traffic"
            );
            counter!(RESOLVER_NOT_READY).increment(1);
            return Ok(None);
        }

        let Some(encrypted) = workspace
            .encrypted_connection_string
            .as_deref()
            .filter(|s| !s.is_empty())
        else {
            // A completed workspace without credentials is a data-integrity
            // problem, not a routine miss.
            error!(workspace_id = %workspace.id, "workspace has no connection string configured");
            return Ok(None);
        };

        let db = self.cache.get(&workspace.id, encrypted).await?;

        let (settings, subscription) = tokio::join!(
            self.cache.connector().load_settings(&db),
            self.catalog.subscription(&workspace.id),
        );
        let settings = settings.map_err(ResolveError::Settings)?;
        let subscription = subscription?.map(|record| SubscriptionContext {
            tier: record.tier,
            status: record.status,
            total_seats: record.included_seats + record.additional_seats,
            current_period_end: record.current_period_end,
        });

        Ok(Some(TenantContext {
            workspace_id: workspace.id,
            slug: workspace.slug,
            db,
            settings,
            subscription,
        }))
    }

    /// Slug-based accessor for internal tooling and backfill scripts.
    ///
    /// Unlike the request-facing path this raises descriptive errors:
    /// operators running a script against a missing or half-provisioned
    /// workspace want the reason, not a silent no-tenant.
    pub async fn tenant_db_by_slug(
        &self,
        slug: &str,
    ) -> Result<(C::Handle, String), ResolveError> {
        let workspace = self
            .catalog
            .workspace_by_slug(slug)
            .await?
            .ok_or_else(|| ResolveError::UnknownWorkspace(slug.to_string()))?;

        if workspace.migration_status != MigrationStatus::Completed {
            return Err(ResolveError::NotReady {
                workspace_id: workspace.id,
                status: workspace.migration_status,
            });
        }

        let encrypted = workspace
            .encrypted_connection_string
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResolveError::MissingConnectionString(workspace.id.clone()))?;

        let db = self.cache.get(&workspace.id, encrypted).await?;
        Ok((db, workspace.id))
    }
}
