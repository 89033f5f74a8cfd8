//! One-time token consumption for cross-domain session hand-off.
//!
//! A token moves from issued to exactly one terminal outcome. The
//! transition happens at the storage layer (consuming delete); everything
//! after the delete can only pick which terminal outcome it was, never
//! resurrect the token.

use crate::metrics_defs::{
    TRUST_LOGIN_INVALID_DOMAIN, TRUST_LOGIN_INVALID_TOKEN, TRUST_LOGIN_SESSION_ERROR,
    TRUST_LOGIN_SUCCESS,
};
use crate::store::{MembershipStore, SessionIssuer, TokenStore, TokenStoreError};
use crate::types::{Role, TransferContext, TransferOutcome};
use chrono::Utc;
use shared::counter;
use shared::host::normalize_host;
use std::sync::Arc;
use tracing::warn;

pub struct TrustLogin {
    tokens: Arc<dyn TokenStore>,
    memberships: Arc<dyn MembershipStore>,
    sessions: Arc<dyn SessionIssuer>,
}

impl TrustLogin {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        memberships: Arc<dyn MembershipStore>,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Self {
        TrustLogin {
            tokens,
            memberships,
            sessions,
        }
    }

    /// Redeems a transfer token presented on `current_host`.
    ///
    /// `workspace_id` is the tenant already resolved for the host, used to
    /// provision portal membership; `None` skips provisioning.
    ///
    /// Failures *before* the consuming delete surface as `Err` so the
    /// caller can distinguish an outage from a bad token. Failures after
    /// it map to terminal outcomes: the token is gone either way.
    pub async fn consume_transfer_token(
        &self,
        raw_token: &str,
        current_host: &str,
        workspace_id: Option<&str>,
    ) -> Result<TransferOutcome, TokenStoreError> {
        let now = Utc::now();
        let Some(record) = self.tokens.find_and_delete(raw_token, now).await? else {
            // Unknown, expired, and already-used all collapse into one
            // answer; a guesser learns nothing from the distinction.
            counter!(TRUST_LOGIN_INVALID_TOKEN).increment(1);
            return Ok(TransferOutcome::InvalidToken);
        };

        let host = normalize_host(current_host);
        if !record.target.matches(&host) {
            // The token is consumed at this point and stays consumed: one
            // seen on the wrong host is treated as captured, and replaying
            // it on the right host must fail too.
            warn!(
                user_id = %record.user_id,
                host = %host,
                "transfer token presented on unexpected host"
            );
            counter!(TRUST_LOGIN_INVALID_DOMAIN).increment(1);
            return Ok(TransferOutcome::InvalidDomain);
        }

        if record.context == TransferContext::Portal
            && let Some(workspace_id) = workspace_id
        {
            let provisioned = self
                .memberships
                .find_or_create(&record.user_id, workspace_id, Role::Member)
                .await;
            if let Err(err) = provisioned {
                warn!(error = %err, user_id = %record.user_id, "portal membership provisioning failed");
                counter!(TRUST_LOGIN_SESSION_ERROR).increment(1);
                return Ok(TransferOutcome::SessionError);
            }
        }

        let session = match self.sessions.create_session(&record.user_id).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, user_id = %record.user_id, "session issuance failed after token consumption");
                counter!(TRUST_LOGIN_SESSION_ERROR).increment(1);
                return Ok(TransferOutcome::SessionError);
            }
        };

        let redirect_to = resolve_redirect(record.callback_url.as_deref(), record.context);
        counter!(TRUST_LOGIN_SUCCESS).increment(1);

        Ok(TransferOutcome::Success {
            session_token: session.token,
            redirect_to,
        })
    }
}

/// Picks the post-login redirect: the token's callback when it is a
/// same-origin relative path, the context default otherwise.
fn resolve_redirect(callback: Option<&str>, context: TransferContext) -> String {
    match callback {
        Some(path) if is_relative_path(path) => path.to_string(),
        Some(rejected) => {
            warn!(callback = %rejected, "rejecting non-relative transfer callback");
            context.default_path().to_string()
        }
        None => context.default_path().to_string(),
    }
}

// Absolute (`https://..`) and protocol-relative (`//..`) URLs would turn
// the redirect into an open redirect.
fn is_relative_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}
