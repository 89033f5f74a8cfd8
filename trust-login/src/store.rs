//! Storage boundaries for the session-transfer flow.

use crate::types::{Role, SessionRecord, TransferContext, TransferTarget, TransferTokenRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(thiserror::Error, Debug)]
pub enum TokenStoreError {
    #[error("token store query failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed token row: {0}")]
    Malformed(String),
}

#[derive(thiserror::Error, Debug)]
#[error("session issuance failed: {0}")]
pub struct SessionIssueError(pub String);

/// Consuming access to transfer tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Atomically finds and deletes an unexpired token.
    ///
    /// The find and the delete must be one storage-level step: two
    /// concurrent redemptions of the same token must observe exactly one
    /// `Some`. Implementations may not check-then-delete.
    async fn find_and_delete(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransferTokenRecord>, TokenStoreError>;
}

/// Membership provisioning in the target workspace. Idempotent; the
/// membership table's uniqueness constraint carries the correctness, so a
/// plain insert-if-absent is fine here.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find_or_create(
        &self,
        user_id: &str,
        workspace_id: &str,
        role: Role,
    ) -> Result<(), TokenStoreError>;
}

/// External session-issuance service.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn create_session(&self, user_id: &str) -> Result<SessionRecord, SessionIssueError>;
}

#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    token: String,
    user_id: String,
    target_domain: Option<String>,
    target_subdomain: Option<String>,
    context: String,
    callback_url: Option<String>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for TransferTokenRecord {
    type Error = TokenStoreError;

    fn try_from(row: TokenRow) -> Result<Self, TokenStoreError> {
        let target = match (row.target_domain, row.target_subdomain) {
            (Some(domain), _) => TransferTarget::Domain(domain),
            (None, Some(subdomain)) => TransferTarget::Subdomain(subdomain),
            (None, None) => {
                return Err(TokenStoreError::Malformed(
                    "token row has neither target domain nor target subdomain".into(),
                ));
            }
        };

        Ok(TransferTokenRecord {
            token: row.token,
            user_id: row.user_id,
            target,
            context: TransferContext::parse(&row.context),
            callback_url: row.callback_url,
            expires_at: row.expires_at,
        })
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn find_and_delete(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransferTokenRecord>, TokenStoreError> {
        // DELETE .. RETURNING is the whole point: the row lock taken by the
        // delete serializes concurrent redemptions, and only the winner
        // gets the row back.
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            DELETE FROM transfer_tokens
            WHERE token = $1 AND expires_at > $2
            RETURNING token, user_id, target_domain, target_subdomain, context,
                      callback_url, expires_at
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransferTokenRecord::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    /// `pool` is the target workspace's own database, not the catalog.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn find_or_create(
        &self,
        user_id: &str,
        workspace_id: &str,
        role: Role,
    ) -> Result<(), TokenStoreError> {
        sqlx::query(
            r#"
            INSERT INTO workspace_members (user_id, workspace_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, workspace_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(workspace_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(domain: Option<&str>, subdomain: Option<&str>) -> TokenRow {
        TokenRow {
            token: "tok_1".into(),
            user_id: "user_1".into(),
            target_domain: domain.map(String::from),
            target_subdomain: subdomain.map(String::from),
            context: "portal".into(),
            callback_url: None,
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn domain_takes_precedence_over_subdomain() {
        let record = TransferTokenRecord::try_from(row(Some("acme.quackback.io"), Some("acme")))
            .unwrap();
        assert_eq!(
            record.target,
            TransferTarget::Domain("acme.quackback.io".into())
        );
    }

    #[test]
    fn subdomain_only_rows_parse() {
        let record = TransferTokenRecord::try_from(row(None, Some("acme"))).unwrap();
        assert_eq!(record.target, TransferTarget::Subdomain("acme".into()));
        assert_eq!(record.context, TransferContext::Portal);
    }

    #[test]
    fn targetless_rows_are_malformed() {
        assert!(matches!(
            TransferTokenRecord::try_from(row(None, None)),
            Err(TokenStoreError::Malformed(_))
        ));
    }
}
