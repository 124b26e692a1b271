use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Sessions last a fixed 24 hours from login and are not renewed on activity.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub group_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Live sessions keyed by session id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, user_id: i64, group_id: i64) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            group_id,
            expires_at: Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS),
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    /// Returns the session if it exists and has not expired.
    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|s| !s.is_expired())
            .cloned()
    }

    /// Removes a session. Returns whether one was present.
    pub async fn destroy(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn prune_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Background task that drops expired sessions on a fixed interval.
pub async fn run_sweep_loop(sessions: SessionStore, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        interval.tick().await;

        let count = sessions.prune_expired().await;
        if count > 0 {
            info!("Session sweep: pruned {} expired sessions", count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_destroy() {
        let store = SessionStore::new();
        let session = store.create(4, 2).await;
        assert_eq!(store.get(session.id).await, Some(session.clone()));

        assert!(store.destroy(session.id).await);
        assert!(!store.destroy(session.id).await);
        assert!(store.get(session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_hidden_and_pruned() {
        let store = SessionStore::new();
        let live = store.create(1, 1).await;
        let stale = Session {
            id: Uuid::new_v4(),
            user_id: 2,
            group_id: 1,
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        store.sessions.write().await.insert(stale.id, stale.clone());

        assert!(store.get(stale.id).await.is_none());
        assert_eq!(store.prune_expired().await, 1);
        assert_eq!(store.count().await, 1);
        assert!(store.get(live.id).await.is_some());
    }

    #[tokio::test]
    async fn test_ttl_is_24_hours() {
        let store = SessionStore::new();
        let session = store.create(1, 1).await;
        let ttl = session.expires_at - Utc::now();
        assert!(ttl <= chrono::Duration::hours(24));
        assert!(ttl > chrono::Duration::hours(23));
    }
}
