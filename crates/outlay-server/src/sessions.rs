//! Bearer token cache
//!
//! Maps opaque tokens to user IDs with an absolute expiry. Tokens are
//! issued at login/registration and revoked on logout.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use outlay_core::auth::generate_token;

/// Default token lifetime (24 hours)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct Session {
    user_id: i64,
    expires_at: Instant,
}

impl Session {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory token store
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a fresh token for a user
    pub async fn issue(&self, user_id: i64) -> String {
        let token = generate_token();
        let mut sessions = self.sessions.write().await;

        // Clean up expired sessions while we're here
        sessions.retain(|_, s| !s.is_expired());

        sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        debug!(user_id, active = sessions.len(), "Issued token");
        token
    }

    /// Resolve a token to its user (None if unknown or expired)
    pub async fn resolve(&self, token: &str) -> Option<i64> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|s| !s.is_expired())
            .map(|s| s.user_id)
    }

    /// Revoke a token; returns whether it existed
    pub async fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token).is_some()
    }

    /// Number of live sessions
    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| !s.is_expired()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let store = SessionStore::default();
        let token = store.issue(7).await;

        assert_eq!(token.len(), 32);
        assert_eq!(store.resolve(&token).await, Some(7));
        assert_eq!(store.resolve("nope").await, None);
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = SessionStore::default();
        let token = store.issue(1).await;

        assert!(store.revoke(&token).await);
        assert!(!store.revoke(&token).await);
        assert_eq!(store.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store.issue(1).await;

        assert_eq!(store.resolve(&token).await, None);
        assert_eq!(store.active_count().await, 0);
    }
}
