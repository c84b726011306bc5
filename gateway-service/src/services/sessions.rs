use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StoreError;
use crate::models::SessionRecord;

/// Issued sessions keyed by the hash of their bearer token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError>;
    async fn find(&self, token_hash: &str) -> Result<Option<SessionRecord>, StoreError>;
    /// Removing an unknown hash is not an error.
    async fn delete(&self, token_hash: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.sessions.insert(record.token_hash_text.clone(), record);
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.get(token_hash).map(|r| r.clone()))
    }

    async fn delete(&self, token_hash: &str) -> Result<(), StoreError> {
        self.sessions.remove(token_hash);
        Ok(())
    }
}
