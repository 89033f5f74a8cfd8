//! Driver boundary between the connection cache and the actual database.

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[derive(thiserror::Error, Debug)]
pub enum ConnectorError {
    #[error("could not connect to workspace database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("settings query failed: {0}")]
    Settings(#[source] sqlx::Error),
}

/// Per-workspace portal settings, read once per resolution from the
/// workspace's own database. A workspace without a settings row is valid.
#[derive(Clone, Debug, PartialEq, Deserialize, sqlx::FromRow)]
pub struct WorkspaceSettings {
    pub portal_name: String,
    pub allow_anonymous_posts: bool,
    pub accent_color: Option<String>,
    pub branding: Option<serde_json::Value>,
}

/// Builds and queries live handles for workspace databases. The associated
/// `Handle` must be cheap to clone; the cache clones it on every hit.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    async fn connect(&self, connection_string: &str) -> Result<Self::Handle, ConnectorError>;

    async fn load_settings(
        &self,
        handle: &Self::Handle,
    ) -> Result<Option<WorkspaceSettings>, ConnectorError>;
}

pub struct PgConnector {
    max_pool_size: u32,
}

impl PgConnector {
    pub fn new() -> Self {
        Self { max_pool_size: 5 }
    }

    /// Per-workspace pool size. The cache multiplies this by up to
    /// `max_connections` workspaces, so keep it small.
    pub fn with_max_pool_size(max_pool_size: u32) -> Self {
        Self { max_pool_size }
    }
}

impl Default for PgConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Handle = PgPool;

    async fn connect(&self, connection_string: &str) -> Result<PgPool, ConnectorError> {
        PgPoolOptions::new()
            .max_connections(self.max_pool_size)
            .connect(connection_string)
            .await
            .map_err(ConnectorError::Connect)
    }

    async fn load_settings(
        &self,
        pool: &PgPool,
    ) -> Result<Option<WorkspaceSettings>, ConnectorError> {
        sqlx::query_as::<_, WorkspaceSettings>(
            r#"
            SELECT portal_name, allow_anonymous_posts, accent_color, branding
            FROM portal_settings
            LIMIT 1
            "#,
        )
        .fetch_optional(pool)
        .await
        .map_err(ConnectorError::Settings)
    }
}
