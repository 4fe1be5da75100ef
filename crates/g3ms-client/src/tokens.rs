//! Token persistence.
//!
//! Access/refresh tokens and the CSRF token live in a durable
//! [`KeyValueStore`] so a session survives process restarts. All
//! clearing paths are idempotent; read failures degrade to "no token"
//! rather than erroring.

use std::sync::Arc;

use g3ms_core::storage::{KeyValueStore, StorageError};
use g3ms_core::util::random::generate_hex_token;

use crate::types::TokenPair;

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "g3ms_access_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "g3ms_refresh_token";
/// Storage key for the CSRF token.
pub const CSRF_TOKEN_KEY: &str = "g3ms_csrf_token";

/// Byte length of the CSRF token (hex-encoded to 64 characters).
const CSRF_TOKEN_BYTES: usize = 32;

/// Reads and writes the persisted credential set.
#[derive(Debug, Clone)]
pub struct TokenManager {
    store: Arc<dyn KeyValueStore>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist a token pair.
    pub async fn set_tokens(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        self.store
            .set(ACCESS_TOKEN_KEY, &tokens.access_token)
            .await?;
        self.store
            .set(REFRESH_TOKEN_KEY, &tokens.refresh_token)
            .await
    }

    /// Update just the access token (refresh-token rotation keeps the
    /// old refresh token unless the server sends a new one).
    pub async fn set_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, token).await
    }

    /// The persisted access token, if any. Read failures are logged and
    /// treated as absent.
    pub async fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY).await
    }

    /// The persisted refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY).await
    }

    /// The persisted CSRF token, if any.
    pub async fn csrf_token(&self) -> Option<String> {
        self.read(CSRF_TOKEN_KEY).await
    }

    /// Get the CSRF token, generating and persisting a fresh 32-byte hex
    /// value if none exists yet.
    pub async fn ensure_csrf_token(&self) -> String {
        if let Some(token) = self.csrf_token().await {
            return token;
        }
        let token = generate_hex_token(CSRF_TOKEN_BYTES);
        if let Err(err) = self.store.set(CSRF_TOKEN_KEY, &token).await {
            tracing::warn!(%err, "failed to persist CSRF token");
        }
        token
    }

    /// Remove every persisted credential. Idempotent and best-effort:
    /// storage failures are logged, never propagated.
    pub async fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, CSRF_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key).await {
                tracing::warn!(key, %err, "failed to clear token");
            }
        }
    }

    /// Remove the access and CSRF tokens only. Used by the idle-timeout
    /// path, which invalidates the session without touching the refresh
    /// token record.
    pub async fn clear_session_tokens(&self) {
        for key in [ACCESS_TOKEN_KEY, CSRF_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key).await {
                tracing::warn!(key, %err, "failed to clear token");
            }
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, %err, "token read failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3ms_core::storage::MemoryStore;

    fn manager() -> TokenManager {
        TokenManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_token_roundtrip() {
        let tokens = manager();
        tokens
            .set_tokens(&TokenPair {
                access_token: "at".into(),
                refresh_token: "rt".into(),
            })
            .await
            .unwrap();

        assert_eq!(tokens.access_token().await, Some("at".to_string()));
        assert_eq!(tokens.refresh_token().await, Some("rt".to_string()));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let tokens = manager();
        tokens
            .set_tokens(&TokenPair {
                access_token: "at".into(),
                refresh_token: "rt".into(),
            })
            .await
            .unwrap();

        tokens.clear().await;
        tokens.clear().await;
        assert_eq!(tokens.access_token().await, None);
        assert_eq!(tokens.refresh_token().await, None);
    }

    #[tokio::test]
    async fn test_csrf_token_generated_once() {
        let tokens = manager();
        let first = tokens.ensure_csrf_token().await;
        let second = tokens.ensure_csrf_token().await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_clear_session_tokens_keeps_refresh() {
        let tokens = manager();
        tokens
            .set_tokens(&TokenPair {
                access_token: "at".into(),
                refresh_token: "rt".into(),
            })
            .await
            .unwrap();
        tokens.ensure_csrf_token().await;

        tokens.clear_session_tokens().await;
        assert_eq!(tokens.access_token().await, None);
        assert_eq!(tokens.csrf_token().await, None);
        assert_eq!(tokens.refresh_token().await, Some("rt".to_string()));
    }

    #[tokio::test]
    async fn test_access_token_rotation() {
        let tokens = manager();
        tokens
            .set_tokens(&TokenPair {
                access_token: "old".into(),
                refresh_token: "rt".into(),
            })
            .await
            .unwrap();
        tokens.set_access_token("new").await.unwrap();
        assert_eq!(tokens.access_token().await, Some("new".to_string()));
        assert_eq!(tokens.refresh_token().await, Some("rt".to_string()));
    }
}
