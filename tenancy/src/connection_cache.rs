//! Process-wide cache of live workspace database handles.
//!
//! One entry per workspace, bounded by `max_connections`, reclaimed after
//! `idle_ttl` without use. Entries are keyed by workspace id and stamped
//! with a fingerprint of the *encrypted* connection string: a hit compares
//! fingerprints instead of decrypting, so credential rotation invalidates
//! the entry on the next lookup without any rotation signal reaching this
//! process.
//!
//! This is a best-effort, per-process cache. Nothing may depend on a hit:
//! a cold process reconnects and behaves identically, just slower.

use crate::connector::{Connector, ConnectorError};
use crate::crypto::{CryptoError, Decryptor};
use crate::metrics_defs::{
    TENANT_CACHE_EVICTED_IDLE, TENANT_CACHE_EVICTED_LRU, TENANT_CACHE_HIT, TENANT_CACHE_MISS,
    TENANT_CACHE_ROTATION,
};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use shared::counter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub const MAX_CONNECTIONS: usize = 100;
pub const IDLE_TTL: Duration = Duration::from_secs(300);

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("workspace id must not be empty")]
    EmptyWorkspaceId,
    #[error("credential decryption failed: {0}")]
    Decrypt(#[from] CryptoError),
    #[error("workspace database connect failed: {0}")]
    Connect(#[from] ConnectorError),
}

struct CacheEntry<H> {
    handle: H,
    fingerprint: [u8; 32],
    last_accessed: Instant,
}

pub struct ConnectionCache<C: Connector> {
    connector: C,
    decryptor: Arc<dyn Decryptor>,
    entries: RwLock<HashMap<String, CacheEntry<C::Handle>>>,
    max_connections: usize,
    idle_ttl: Duration,
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C, decryptor: Arc<dyn Decryptor>) -> Self {
        Self::with_limits(connector, decryptor, MAX_CONNECTIONS, IDLE_TTL)
    }

    pub fn with_limits(
        connector: C,
        decryptor: Arc<dyn Decryptor>,
        max_connections: usize,
        idle_ttl: Duration,
    ) -> Self {
        ConnectionCache {
            connector,
            decryptor,
            entries: RwLock::new(HashMap::new()),
            max_connections,
            idle_ttl,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Returns a live handle for the workspace, connecting on demand.
    ///
    /// The fast path compares the stored fingerprint against the supplied
    /// ciphertext and never touches the decryptor. On a miss the lock is
    /// released while decrypting and connecting; two concurrent misses for
    /// the same workspace may therefore both connect, and the later insert
    /// wins. A failed decrypt or connect leaves the cache untouched so the
    /// next call retries from scratch.
    pub async fn get(
        &self,
        workspace_id: &str,
        encrypted_connection_string: &str,
    ) -> Result<C::Handle, CacheError> {
        if workspace_id.is_empty() {
            return Err(CacheError::EmptyWorkspaceId);
        }
        let fingerprint = fingerprint(encrypted_connection_string);

        {
            let mut entries = self.entries.write();
            let mut rotated = false;
            if let Some(entry) = entries.get_mut(workspace_id) {
                if entry.fingerprint == fingerprint {
                    entry.last_accessed = Instant::now();
                    counter!(TENANT_CACHE_HIT).increment(1);
                    return Ok(entry.handle.clone());
                }
                rotated = true;
            }
            if rotated {
                // Rotated credentials: the stored handle was built from a
                // previous connection string. Abandon it and reconnect.
                entries.remove(workspace_id);
                counter!(TENANT_CACHE_ROTATION).increment(1);
                debug!(workspace_id, "connection string rotated, rebuilding handle");
            }
        }
        counter!(TENANT_CACHE_MISS).increment(1);

        let plaintext = self
            .decryptor
            .decrypt(encrypted_connection_string, workspace_id)
            .await?;
        let handle = self.connector.connect(&plaintext).await?;

        let mut entries = self.entries.write();
        if entries.len() >= self.max_connections {
            self.evict_oldest(&mut entries);
        }
        entries.insert(
            workspace_id.to_string(),
            CacheEntry {
                handle: handle.clone(),
                fingerprint,
                last_accessed: Instant::now(),
            },
        );

        Ok(handle)
    }

    /// Drops the entry for one workspace, if present. Used when a caller
    /// learns out-of-band that the workspace's credentials changed.
    pub fn clear(&self, workspace_id: &str) {
        self.entries.write().remove(workspace_id);
    }

    pub fn clear_all(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    // Two phases: reclaim every idle entry first, and only if that freed
    // nothing at capacity, drop the least recently used one. Sweeping idle
    // entries before LRU keeps warm-but-old handles alive while cold ones
    // exist.
    fn evict_oldest(&self, entries: &mut HashMap<String, CacheEntry<C::Handle>>) {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_accessed) <= self.idle_ttl);

        let swept = before - entries.len();
        if swept > 0 {
            counter!(TENANT_CACHE_EVICTED_IDLE).increment(swept as u64);
            debug!(swept, "reclaimed idle workspace connections");
        }

        if entries.len() >= self.max_connections {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(workspace_id, _)| workspace_id.clone());
            if let Some(workspace_id) = oldest {
                entries.remove(&workspace_id);
                counter!(TENANT_CACHE_EVICTED_LRU).increment(1);
                debug!(workspace_id, "evicted least recently used connection");
            }
        }
    }

    #[cfg(test)]
    fn backdate(&self, workspace_id: &str, age: Duration) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(workspace_id) {
            entry.last_accessed = Instant::now()
                .checked_sub(age)
                .expect("test backdate beyond clock origin");
        }
    }
}

fn fingerprint(ciphertext: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(ciphertext.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{MockConnector, MockDecryptor};

    fn cache_with_limits(
        max_connections: usize,
        idle_ttl: Duration,
    ) -> (ConnectionCache<MockConnector>, MockConnector, Arc<MockDecryptor>) {
        let connector = MockConnector::new();
        let decryptor = Arc::new(MockDecryptor::new());
        let cache = ConnectionCache::with_limits(
            connector.clone(),
            decryptor.clone(),
            max_connections,
            idle_ttl,
        );
        (cache, connector, decryptor)
    }

    #[tokio::test]
    async fn repeated_gets_share_one_handle() {
        let (cache, connector, decryptor) = cache_with_limits(10, IDLE_TTL);

        let first = cache.get("ws_1", "enc:pg://one").await.unwrap();
        let second = cache.get("ws_1", "enc:pg://one").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.connects(), 1);
        assert_eq!(decryptor.decrypts(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn rotation_reconnects_exactly_once() {
        let (cache, connector, decryptor) = cache_with_limits(10, IDLE_TTL);

        let old = cache.get("ws_1", "enc:pg://old").await.unwrap();
        let new = cache.get("ws_1", "enc:pg://new").await.unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(new.connection_string, "pg://new");
        assert_eq!(connector.connects(), 2);
        assert_eq!(decryptor.decrypts(), 2);
        assert_eq!(cache.len(), 1, "rotation must not leave a second entry");
    }

    #[tokio::test]
    async fn capacity_bound_holds_after_overflow() {
        let (cache, _connector, _decryptor) = cache_with_limits(3, IDLE_TTL);

        for i in 0..4 {
            let workspace_id = format!("ws_{i}");
            let ciphertext = format!("enc:pg://{i}");
            cache.get(&workspace_id, &ciphertext).await.unwrap();
        }

        assert!(cache.len() <= 3);
    }

    #[tokio::test]
    async fn lru_entry_is_the_one_evicted() {
        let (cache, connector, _decryptor) = cache_with_limits(2, IDLE_TTL);

        cache.get("ws_a", "enc:pg://a").await.unwrap();
        cache.get("ws_b", "enc:pg://b").await.unwrap();
        // Make ws_b unambiguously the least recently used.
        cache.backdate("ws_b", Duration::from_secs(1));

        cache.get("ws_c", "enc:pg://c").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(connector.connects(), 3);

        // ws_a survived: getting it again is a hit, not a reconnect.
        cache.get("ws_a", "enc:pg://a").await.unwrap();
        assert_eq!(connector.connects(), 3);

        // ws_b was the victim: getting it again reconnects.
        cache.get("ws_b", "enc:pg://b").await.unwrap();
        assert_eq!(connector.connects(), 4);
    }

    #[tokio::test]
    async fn idle_entries_are_swept_even_under_capacity() {
        let (cache, _connector, _decryptor) = cache_with_limits(3, IDLE_TTL);

        cache.get("ws_a", "enc:pg://a").await.unwrap();
        cache.get("ws_b", "enc:pg://b").await.unwrap();
        cache.get("ws_c", "enc:pg://c").await.unwrap();
        cache.backdate("ws_a", IDLE_TTL + Duration::from_secs(1));
        cache.backdate("ws_b", IDLE_TTL + Duration::from_secs(1));

        // The insert triggers one eviction pass; both idle entries go, not
        // just the single LRU victim.
        cache.get("ws_d", "enc:pg://d").await.unwrap();

        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failed_connect_leaves_no_entry() {
        let (cache, connector, _decryptor) = cache_with_limits(10, IDLE_TTL);

        connector.fail_next(true);
        assert!(cache.get("ws_1", "enc:pg://one").await.is_err());
        assert_eq!(cache.len(), 0);

        // Next call retries the miss path cleanly.
        connector.fail_next(false);
        cache.get("ws_1", "enc:pg://one").await.unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn undecryptable_ciphertext_is_an_error() {
        let (cache, connector, _decryptor) = cache_with_limits(10, IDLE_TTL);

        let err = cache.get("ws_1", "garbage").await.unwrap_err();
        assert!(matches!(err, CacheError::Decrypt(_)));
        assert_eq!(connector.connects(), 0);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn empty_workspace_id_is_rejected() {
        let (cache, _connector, _decryptor) = cache_with_limits(10, IDLE_TTL);

        assert!(matches!(
            cache.get("", "enc:pg://one").await,
            Err(CacheError::EmptyWorkspaceId)
        ));
    }

    #[tokio::test]
    async fn clear_drops_one_workspace() {
        let (cache, connector, _decryptor) = cache_with_limits(10, IDLE_TTL);

        cache.get("ws_1", "enc:pg://one").await.unwrap();
        cache.get("ws_2", "enc:pg://two").await.unwrap();

        cache.clear("ws_1");
        assert_eq!(cache.len(), 1);

        // ws_1 reconnects, ws_2 is still cached.
        cache.get("ws_1", "enc:pg://one").await.unwrap();
        cache.get("ws_2", "enc:pg://two").await.unwrap();
        assert_eq!(connector.connects(), 3);
    }

    #[tokio::test]
    async fn clear_all_empties_the_cache() {
        let (cache, _connector, _decryptor) = cache_with_limits(10, IDLE_TTL);

        cache.get("ws_1", "enc:pg://one").await.unwrap();
        cache.get("ws_2", "enc:pg://two").await.unwrap();

        cache.clear_all();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn concurrent_cold_misses_converge_to_one_entry() {
        let (cache, connector, _decryptor) = cache_with_limits(10, IDLE_TTL);
        let cache = Arc::new(cache);

        let a = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get("ws_1", "enc:pg://one").await }
        });
        let b = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get("ws_1", "enc:pg://one").await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Duplicate connects are tolerated, a duplicate entry is not.
        assert!(connector.connects() >= 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fingerprints_differ_per_ciphertext() {
        assert_eq!(fingerprint("enc:a"), fingerprint("enc:a"));
        assert_ne!(fingerprint("enc:a"), fingerprint("enc:b"));
    }
}
