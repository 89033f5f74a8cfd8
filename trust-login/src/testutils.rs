//! In-memory doubles for the session-transfer storage boundaries.

use crate::store::{
    MembershipStore, SessionIssuer, SessionIssueError, TokenStore, TokenStoreError,
};
use crate::types::{Role, SessionRecord, TransferTokenRecord};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Token store with the same consume-atomically contract as the Postgres
/// implementation: the mutex plays the role of the row lock, so concurrent
/// redemptions observe the row at most once.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, TransferTokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: TransferTokenRecord) {
        self.tokens
            .lock()
            .unwrap()
            .insert(record.token.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn find_and_delete(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransferTokenRecord>, TokenStoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        let Some(record) = tokens.remove(token) else {
            return Ok(None);
        };
        if record.expires_at > now {
            Ok(Some(record))
        } else {
            // Expired rows are deleted on touch, mirroring what the SQL
            // variant leaves for garbage collection but never returns.
            Ok(None)
        }
    }
}

#[derive(Default)]
pub struct RecordingMembershipStore {
    created: Mutex<Vec<(String, String, Role)>>,
}

impl RecordingMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<(String, String, Role)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl MembershipStore for RecordingMembershipStore {
    async fn find_or_create(
        &self,
        user_id: &str,
        workspace_id: &str,
        role: Role,
    ) -> Result<(), TokenStoreError> {
        let mut created = self.created.lock().unwrap();
        let exists = created
            .iter()
            .any(|(u, w, _)| u == user_id && w == workspace_id);
        if !exists {
            created.push((user_id.to_string(), workspace_id.to_string(), role));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct StaticSessionIssuer {
    fail: AtomicBool,
    issued: AtomicUsize,
}

impl StaticSessionIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionIssuer for StaticSessionIssuer {
    async fn create_session(&self, user_id: &str) -> Result<SessionRecord, SessionIssueError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SessionIssueError("issuer offline".into()));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(SessionRecord {
            token: format!("sess_{user_id}_{n}"),
            expires_at: Utc::now() + Duration::days(30),
        })
    }
}
