//! Session store (C9): one JSON record per session, keyed by session id,
//! with a configured inactivity TTL. Pluggable backend, matching the
//! teacher's `SessionStore` trait shape (`InMemorySessionStore` default,
//! a Redis-backed store generalizing the teacher's `ScyllaSessionStore`
//! to the spec's "external short-lived key-value store with TTL").

use async_trait::async_trait;
use bv_rag_core::ConversationSession;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::MemoryError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<ConversationSession>, MemoryError>;

    /// Loads the session, or creates a fresh one with the given id if absent.
    async fn load_or_create(&self, id: Uuid) -> Result<ConversationSession, MemoryError> {
        match self.load(id).await? {
            Some(session) => Ok(session),
            None => Ok(ConversationSession::new(id, None, Utc::now())),
        }
    }

    async fn store(&self, session: &ConversationSession) -> Result<(), MemoryError>;

    async fn delete(&self, id: Uuid) -> Result<(), MemoryError>;

    fn is_distributed(&self) -> bool;

    /// Best-effort session count for the admin stats endpoint. Stores
    /// that can't report this cheaply (Redis, without a `SCAN` sweep)
    /// return `None` rather than pay for an expensive count on every call.
    async fn session_count(&self) -> Option<usize> {
        None
    }
}

/// Default backend: a `RwLock`-guarded map. Expiry is swept lazily on
/// `load`, matching the teacher's `InMemorySessionStore` shape.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, ConversationSession>>,
    ttl: chrono::Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::hours(ttl_hours),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<ConversationSession>, MemoryError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(&id) {
            if session.is_expired(now, self.ttl) {
                sessions.remove(&id);
                return Ok(None);
            }
            return Ok(Some(session.clone()));
        }
        Ok(None)
    }

    async fn store(&self, session: &ConversationSession) -> Result<(), MemoryError> {
        self.sessions.write().insert(session.id, session.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), MemoryError> {
        self.sessions.write().remove(&id);
        Ok(())
    }

    fn is_distributed(&self) -> bool {
        false
    }

    async fn session_count(&self) -> Option<usize> {
        Some(self.sessions.read().len())
    }
}

/// Production backend: one JSON value per session key, with the TTL
/// enforced by Redis itself via `SET ... EX`.
pub struct RedisSessionStore {
    client: redis::Client,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(redis_url: &str, ttl_hours: i64) -> Result<Self, MemoryError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client, ttl: Duration::from_secs((ttl_hours.max(0) as u64) * 3600) })
    }

    fn key(id: Uuid) -> String {
        format!("bv-rag:session:{id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<ConversationSession>, MemoryError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET").arg(Self::key(id)).query_async(&mut conn).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, session: &ConversationSession) -> Result<(), MemoryError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(session)?;
        redis::cmd("SET")
            .arg(Self::key(session.id))
            .arg(json)
            .arg("EX")
            .arg(self.ttl.as_secs())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), MemoryError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("DEL").arg(Self::key(id)).query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    fn is_distributed(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_or_create_fresh_session() {
        let store = InMemorySessionStore::new(24);
        let id = Uuid::new_v4();
        let session = store.load_or_create(id).await.unwrap();
        assert_eq!(session.id, id);
        assert!(session.turns.is_empty());
    }

    #[tokio::test]
    async fn test_store_then_load_roundtrip() {
        let store = InMemorySessionStore::new(24);
        let id = Uuid::new_v4();
        let mut session = ConversationSession::new(id, None, Utc::now());
        session.touch_regulation("SOLAS III/31");
        store.store(&session).await.unwrap();

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.active_regulations.front().unwrap(), "SOLAS III/31");
    }

    #[tokio::test]
    async fn test_expired_session_is_evicted() {
        let store = InMemorySessionStore::new(0);
        let id = Uuid::new_v4();
        let old = Utc::now() - chrono::Duration::hours(1);
        let session = ConversationSession::new(id, None, old);
        store.store(&session).await.unwrap();

        assert!(store.load(id).await.unwrap().is_none());
    }
}
