//! Trait doubles for exercising the cache and resolver without a database.

use crate::connector::{Connector, ConnectorError, WorkspaceSettings};
use crate::crypto::{CryptoError, Decryptor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Stand-in for a live database handle. Tests compare handles with
/// `Arc::ptr_eq` to prove the cache returned the same connection.
#[derive(Debug)]
pub struct MockDb {
    pub connection_string: String,
}

#[derive(Clone, Default)]
pub struct MockConnector {
    connects: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    fail_settings: Arc<AtomicBool>,
    settings: Arc<Mutex<Option<WorkspaceSettings>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_settings(&self, fail: bool) {
        self.fail_settings.store(fail, Ordering::SeqCst);
    }

    pub fn set_settings(&self, settings: Option<WorkspaceSettings>) {
        *self.settings.lock() = settings;
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Handle = Arc<MockDb>;

    async fn connect(&self, connection_string: &str) -> Result<Arc<MockDb>, ConnectorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConnectorError::Connect(sqlx::Error::PoolClosed));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockDb {
            connection_string: connection_string.to_string(),
        }))
    }

    async fn load_settings(
        &self,
        _handle: &Arc<MockDb>,
    ) -> Result<Option<WorkspaceSettings>, ConnectorError> {
        if self.fail_settings.load(Ordering::SeqCst) {
            return Err(ConnectorError::Settings(sqlx::Error::PoolClosed));
        }
        Ok(self.settings.lock().clone())
    }
}

/// Unwraps an `enc:` prefix instead of running a real cipher, and counts
/// calls so tests can assert the cache's zero-decrypts-on-hit contract.
#[derive(Default)]
pub struct MockDecryptor {
    decrypts: AtomicUsize,
}

impl MockDecryptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decrypts(&self) -> usize {
        self.decrypts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Decryptor for MockDecryptor {
    async fn decrypt(&self, ciphertext: &str, _workspace_id: &str) -> Result<String, CryptoError> {
        let Some(plaintext) = ciphertext.strip_prefix("enc:") else {
            return Err(CryptoError::Malformed);
        };
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        Ok(plaintext.to_string())
    }
}
