pub mod config;
pub mod connection_cache;
pub mod connector;
pub mod crypto;
pub mod host;
pub mod metrics_defs;
pub mod negative_cache;
pub mod resolver;
pub mod testutils;

pub use config::TenancyConfig;
pub use connection_cache::{CacheError, ConnectionCache};
pub use connector::{Connector, ConnectorError, PgConnector, WorkspaceSettings};
pub use crypto::{AesGcmDecryptor, CryptoError, Decryptor};
pub use resolver::{ResolveError, SubscriptionContext, TenantContext, TenantResolver};
