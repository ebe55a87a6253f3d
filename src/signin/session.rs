// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session records and the store contract the sign-in flow relies on.
//!
//! The store is always injected. The pipeline only reads and writes the
//! `nonce`, `user` and `error` fields of a [`Session`].

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::identity::ResolvedUser;

/// Reason a sign-in attempt failed, as persisted into the session.
///
/// Only user-safe text is stored here. Operational causes are logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionError {
    /// Stable error code (`access_denied`, `invalid_signature`, ...)
    pub code: String,
    /// Name of the denying check, when a check denied the attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    /// Message suitable for showing to the user
    pub message: String,
    /// When the failure was recorded
    pub at: DateTime<Utc>,
}

/// Server-side session record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Nonce issued for the pending sign-in attempt
    #[serde(default)]
    pub nonce: Option<String>,
    /// Identity established by a successful sign-in
    #[serde(default)]
    pub user: Option<ResolvedUser>,
    /// Why the last attempt failed
    #[serde(default)]
    pub error: Option<SessionError>,
}

/// Session store failures. "Not found" is not an error: `get` returns `None`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous get/set contract for session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, SessionStoreError>;

    async fn set(&self, session_id: &str, session: Session) -> Result<(), SessionStoreError>;
}

struct SessionEntry {
    session: Session,
    touched_at: Instant,
}

/// Bounded in-process session store with expiry.
///
/// Entries are evicted least-recently-used once `capacity` is reached and
/// dropped on read once `ttl` has passed since they were last written.
pub struct InMemorySessionStore {
    sessions: Mutex<LruCache<String, SessionEntry>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Number of live entries, expired ones included until next touched.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, LruCache<String, SessionEntry>>, SessionStoreError> {
        self.sessions
            .lock()
            .map_err(|_| SessionStoreError::Unavailable("session map lock poisoned".to_string()))
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(24 * 60 * 60))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, SessionStoreError> {
        let mut sessions = self.lock()?;
        if let Some(entry) = sessions.get(session_id) {
            if entry.touched_at.elapsed() < self.ttl {
                return Ok(Some(entry.session.clone()));
            }
            sessions.pop(session_id);
            tracing::debug!(session_id, "Session expired");
        }
        Ok(None)
    }

    async fn set(&self, session_id: &str, session: Session) -> Result<(), SessionStoreError> {
        let mut sessions = self.lock()?;
        sessions.put(
            session_id.to_string(),
            SessionEntry {
                session,
                touched_at: Instant::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_nonce(nonce: &str) -> Session {
        Session {
            nonce: Some(nonce.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = InMemorySessionStore::new(10, Duration::from_secs(300));
        assert!(store.get("sid-1").await.unwrap().is_none());

        store.set("sid-1", with_nonce("abc")).await.unwrap();

        let session = store.get("sid-1").await.unwrap().unwrap();
        assert_eq!(session.nonce.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = InMemorySessionStore::default();
        store.set("sid-1", with_nonce("first")).await.unwrap();
        store.set("sid-1", with_nonce("second")).await.unwrap();

        let session = store.get("sid-1").await.unwrap().unwrap();
        assert_eq!(session.nonce.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn stale_sessions_expire() {
        let store = InMemorySessionStore::new(10, Duration::from_millis(1));
        store.set("sid-1", with_nonce("abc")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(store.get("sid-1").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = InMemorySessionStore::new(2, Duration::from_secs(300));
        store.set("a", with_nonce("1")).await.unwrap();
        store.set("b", with_nonce("2")).await.unwrap();
        store.set("c", with_nonce("3")).await.unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
        assert_eq!(store.len(), 2);
    }
}
