//! Thread-safe in-memory session registry.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::model::Session;
use crate::config::SessionConfig;

/// Process-wide registry of collection sessions.
///
/// All map operations are serialized behind one mutex held only for the
/// duration of the operation, never across an external network call.
/// Two concurrent turns against the same session id can therefore
/// interleave and the last update wins; with a single human operator per
/// session this is an accepted limitation, not something the store
/// guards against.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    /// Inactivity window after which a session expires.
    ttl: Duration,
    /// Minimum time between opportunistic expiry sweeps.
    sweep_interval: Duration,
    /// Soft cap; the least-recently-active session is evicted beyond it.
    max_sessions: usize,
    last_sweep: Mutex<DateTime<Utc>>,
}

impl SessionStore {
    /// Creates a store with the given TTL, sweep interval and capacity.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(config.ttl_secs as i64),
            sweep_interval: Duration::seconds(config.sweep_interval_secs as i64),
            max_sessions: config.max_sessions.max(1),
            last_sweep: Mutex::new(Utc::now()),
        }
    }

    /// Creates and registers a new session built by `factory` from a
    /// fresh UUID, returning a clone of it. Evicts the least-recently
    /// active session when the registry is at capacity.
    pub async fn create<F>(&self, factory: F) -> Session
    where
        F: FnOnce(String) -> Session,
    {
        let id = Uuid::new_v4().to_string();
        let session = factory(id.clone());
        let mut sessions = self.sessions.lock().await;
        while sessions.len() >= self.max_sessions {
            let stalest = sessions
                .values()
                .min_by_key(|s| s.last_activity)
                .map(|s| s.id.clone());
            match stalest {
                Some(evict_id) => {
                    warn!(session_id = %evict_id, "session registry full, evicting stalest");
                    sessions.remove(&evict_id);
                }
                None => break,
            }
        }
        sessions.insert(id, session.clone());
        session
    }

    /// Returns a clone of the session, or `None` for unknown or expired
    /// ids.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .filter(|session| !session.is_expired(self.ttl))
            .cloned()
    }

    /// Writes a session back. Last write wins.
    pub async fn update(&self, session: Session) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.id.clone(), session);
    }

    /// Removes a session, returning whether it existed.
    pub async fn delete(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id).is_some()
    }

    /// Number of tracked sessions, expired ones included until swept.
    pub async fn count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.len()
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl));
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "swept expired sessions");
        }
        removed
    }

    /// Runs the expiry sweep when the configured interval has elapsed
    /// since the previous one.
    pub async fn sweep_if_due(&self) -> usize {
        {
            let mut last_sweep = self.last_sweep.lock().await;
            let now = Utc::now();
            if now - *last_sweep < self.sweep_interval {
                return 0;
            }
            *last_sweep = now;
        }
        self.sweep_expired().await
    }

    /// Resumes the session when the id is known and fresh, otherwise
    /// creates a new one via `factory`. Runs the expiry sweep
    /// opportunistically when one is due.
    pub async fn get_or_create<F>(&self, session_id: Option<&str>, factory: F) -> Session
    where
        F: FnOnce(String) -> Session,
    {
        self.sweep_if_due().await;

        if let Some(id) = session_id {
            if let Some(session) = self.get(id).await {
                return session;
            }
        }
        self.create(factory).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session(id: String) -> Session {
        Session::new(id, vec!["a".to_string(), "b".to_string()])
    }

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig::default())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store();
        let created = store.create(make_session).await;
        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_returns_none() {
        let store = store();
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_update_last_write_wins() {
        let store = store();
        let mut session = store.create(make_session).await;
        session.collect_parameter("a", "1");
        store.update(session.clone()).await;
        let fetched = store.get(&session.id).await.unwrap();
        assert_eq!(fetched.collected_values["a"], "1");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store();
        let session = store.create(make_session).await;
        assert!(store.delete(&session.id).await);
        assert!(!store.delete(&session.id).await);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_expired_session_is_replaced() {
        let store = SessionStore::new(&SessionConfig {
            sweep_interval_secs: 0,
            ..SessionConfig::default()
        });
        let mut session = store.create(make_session).await;
        session.last_activity = Utc::now() - Duration::seconds(7200);
        store.update(session.clone()).await;

        assert!(store.get(&session.id).await.is_none());
        let resumed = store.get_or_create(Some(&session.id), make_session).await;
        assert_ne!(resumed.id, session.id);
        // the sweep dropped the stale entry
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_stalest_session() {
        let store = SessionStore::new(&SessionConfig {
            max_sessions: 2,
            ..SessionConfig::default()
        });
        let mut oldest = store.create(make_session).await;
        oldest.last_activity = Utc::now() - Duration::seconds(60);
        store.update(oldest.clone()).await;
        let fresh = store.create(make_session).await;

        let third = store.create(make_session).await;
        assert_eq!(store.count().await, 2);
        assert!(store.get(&oldest.id).await.is_none());
        assert!(store.get(&fresh.id).await.is_some());
        assert!(store.get(&third.id).await.is_some());
    }

    #[tokio::test]
    async fn test_get_or_create_resumes_fresh_session() {
        let store = store();
        let session = store.create(make_session).await;
        let resumed = store.get_or_create(Some(&session.id), make_session).await;
        assert_eq!(resumed.id, session.id);
        assert_eq!(store.count().await, 1);
    }
}
