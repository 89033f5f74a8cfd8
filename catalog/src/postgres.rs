//! Catalog registry backed by a Postgres database queried directly.

use crate::store::{CatalogError, CatalogStore};
use crate::types::{MigrationStatus, SubscriptionRecord, WorkspaceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct WorkspaceRow {
    id: String,
    slug: String,
    migration_status: String,
    encrypted_connection_string: Option<String>,
    owner_email: Option<String>,
}

impl TryFrom<WorkspaceRow> for WorkspaceRecord {
    type Error = CatalogError;

    fn try_from(row: WorkspaceRow) -> Result<Self, CatalogError> {
        let migration_status = MigrationStatus::parse(&row.migration_status).ok_or_else(|| {
            CatalogError::Malformed(format!(
                "workspace {}: unknown migration status {:?}",
                row.id, row.migration_status
            ))
        })?;

        Ok(WorkspaceRecord {
            id: row.id,
            slug: row.slug,
            migration_status,
            encrypted_connection_string: row.encrypted_connection_string,
            owner_email: row.owner_email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    workspace_id: String,
    tier: String,
    status: String,
    included_seats: i32,
    additional_seats: i32,
    current_period_end: Option<DateTime<Utc>>,
}

impl From<SubscriptionRow> for SubscriptionRecord {
    fn from(row: SubscriptionRow) -> Self {
        SubscriptionRecord {
            workspace_id: row.workspace_id,
            tier: row.tier,
            status: row.status,
            included_seats: row.included_seats,
            additional_seats: row.additional_seats,
            current_period_end: row.current_period_end,
        }
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn workspace_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<WorkspaceRecord>, CatalogError> {
        let row = sqlx::query_as::<_, WorkspaceRow>(
            r#"
            SELECT id, slug, migration_status, encrypted_connection_string, owner_email
            FROM workspaces
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkspaceRecord::try_from).transpose()
    }

    async fn workspace_by_custom_domain(
        &self,
        host: &str,
    ) -> Result<Option<WorkspaceRecord>, CatalogError> {
        // Unverified mappings must never resolve, so the verification and
        // kind checks live in the query rather than in callers.
        let row = sqlx::query_as::<_, WorkspaceRow>(
            r#"
            SELECT w.id, w.slug, w.migration_status, w.encrypted_connection_string, w.owner_email
            FROM workspaces w
            JOIN workspace_domains d ON d.workspace_id = w.id
            WHERE d.host = $1
              AND d.kind = 'custom'
              AND d.verified_at IS NOT NULL
            "#,
        )
        .bind(host)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkspaceRecord::try_from).transpose()
    }

    async fn subscription(
        &self,
        workspace_id: &str,
    ) -> Result<Option<SubscriptionRecord>, CatalogError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT workspace_id, tier, status, included_seats, additional_seats,
                   current_period_end
            FROM subscriptions
            WHERE workspace_id = $1
            "#,
        )
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SubscriptionRecord::from))
    }
}
