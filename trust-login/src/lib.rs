pub mod flow;
pub mod metrics_defs;
pub mod store;
pub mod testutils;
pub mod types;

pub use flow::TrustLogin;
pub use store::{
    MembershipStore, PgMembershipStore, PgTokenStore, SessionIssueError, SessionIssuer,
    TokenStore, TokenStoreError,
};
pub use types::{
    Role, SessionRecord, TransferContext, TransferOutcome, TransferTarget, TransferTokenRecord,
};
