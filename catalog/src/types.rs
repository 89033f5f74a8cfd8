use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Provisioning state of a workspace. Only `Completed` workspaces may
/// receive traffic; everything else resolves to "no tenant".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Pending,
    Provisioning,
    Completed,
    Failed,
}

impl MigrationStatus {
    pub fn parse(s: &str) -> Option<MigrationStatus> {
        match s {
            "pending" => Some(MigrationStatus::Pending),
            "provisioning" => Some(MigrationStatus::Provisioning),
            "completed" => Some(MigrationStatus::Completed),
            "failed" => Some(MigrationStatus::Failed),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Pending => "pending",
            MigrationStatus::Provisioning => "provisioning",
            MigrationStatus::Completed => "completed",
            MigrationStatus::Failed => "failed",
        }
    }
}

/// A workspace row from the catalog registry. Read-only to this workspace;
/// the provisioning pipeline owns writes.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkspaceRecord {
    pub id: String,
    pub slug: String,
    pub migration_status: MigrationStatus,
    /// Opaque ciphertext; changes whenever credentials are rotated.
    pub encrypted_connection_string: Option<String>,
    pub owner_email: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionRecord {
    pub workspace_id: String,
    pub tier: String,
    pub status: String,
    pub included_seats: i32,
    pub additional_seats: i32,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainKind {
    /// Customer-supplied domain, usable only once DNS verification finishes.
    Custom,
    /// Internal mapping kinds (previews, redirects) never resolve a tenant.
    Internal,
}

/// A host → workspace mapping row. Only verified `Custom` mappings resolve.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainMapping {
    pub host: String,
    pub kind: DomainKind,
    pub verified: bool,
    pub workspace_id: String,
}
