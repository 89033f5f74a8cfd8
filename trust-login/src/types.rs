use chrono::{DateTime, Utc};
use shared::host::normalize_host;

/// What the token grants access to. Anything that is not the public portal
/// is treated as the admin dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferContext {
    Portal,
    Admin,
}

impl TransferContext {
    pub fn parse(s: &str) -> TransferContext {
        match s {
            "portal" => TransferContext::Portal,
            _ => TransferContext::Admin,
        }
    }

    /// Landing page when the token carries no usable callback.
    pub const fn default_path(&self) -> &'static str {
        match self {
            TransferContext::Portal => "/",
            TransferContext::Admin => "/admin",
        }
    }
}

/// The host a token may be redeemed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferTarget {
    /// Full host, compared exactly after normalization.
    Domain(String),
    /// Workspace subdomain; any host under it is acceptable.
    Subdomain(String),
}

impl TransferTarget {
    /// `host` must already be in normal form (see [`normalize_host`]).
    pub fn matches(&self, host: &str) -> bool {
        match self {
            TransferTarget::Domain(domain) => host == normalize_host(domain),
            TransferTarget::Subdomain(subdomain) => {
                let prefix = format!("{}.", normalize_host(subdomain));
                host.starts_with(&prefix)
            }
        }
    }
}

/// A one-time session-transfer token row, as returned by the consuming
/// delete. Never serialized; the raw token must not leave this flow.
#[derive(Clone, Debug)]
pub struct TransferTokenRecord {
    pub token: String,
    pub user_id: String,
    pub target: TransferTarget,
    pub context: TransferContext,
    pub callback_url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct SessionRecord {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

/// Result of one consumption attempt. Exactly one outcome per token, ever:
/// every variant except `InvalidToken` means the token is now gone.
#[derive(Clone, Debug, PartialEq)]
pub enum TransferOutcome {
    Success {
        session_token: String,
        redirect_to: String,
    },
    InvalidToken,
    InvalidDomain,
    SessionError,
}

impl TransferOutcome {
    /// Redirect target for the embedding handler. Failure variants map to
    /// generic login-error query parameters; none of them says why beyond
    /// the coarse category.
    pub fn redirect_path(&self) -> &str {
        match self {
            TransferOutcome::Success { redirect_to, .. } => redirect_to,
            TransferOutcome::InvalidToken => "/login?error=invalid_token",
            TransferOutcome::InvalidDomain => "/login?error=invalid_domain",
            TransferOutcome::SessionError => "/login?error=session_error",
        }
    }
}
