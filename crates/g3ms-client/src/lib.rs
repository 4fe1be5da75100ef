//! # G3MS API Client
//!
//! Typed async HTTP client for the G3MS REST API. Covers the auth,
//! onboarding, drops, and lookup endpoints, persists tokens through a
//! pluggable store, and maps every non-2xx response to a structured
//! [`ClientError`] so callers match on variants instead of message
//! substrings.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use g3ms_client::{ClientOptions, Credentials, G3msClient};
//! use g3ms_core::storage::MemoryStore;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = G3msClient::new(ClientOptions {
//!         base_url: "https://api.g3ms.co".into(),
//!         ..Default::default()
//!     }, Arc::new(MemoryStore::new()));
//!
//!     client.login(&Credentials {
//!         email: "ada@example.com".into(),
//!         password: "longenough1".into(),
//!     }).await?;
//!
//!     let status = client.get_onboarding_status().await?;
//!     println!("next step: {:?}", status.state);
//!     Ok(())
//! }
//! ```

mod auth;
mod drops;
mod error;
mod onboarding;
mod tokens;
mod types;

pub use error::ClientError;
pub use tokens::{TokenManager, ACCESS_TOKEN_KEY, CSRF_TOKEN_KEY, REFRESH_TOKEN_KEY};
pub use types::*;

use std::sync::Arc;

use g3ms_core::storage::KeyValueStore;
use tokio::sync::watch;

// ─── Client Options ────────────────────────────────────────────────

/// Configuration for the G3MS API client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the G3MS API server (e.g. `https://api.g3ms.co`).
    pub base_url: String,

    /// Path prefix for API endpoints (default: `/api/v1`).
    pub base_path: String,

    /// HTTP request timeout in seconds (default: 30). A hung request
    /// resolves to [`ClientError::Network`] instead of pending forever.
    pub timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            base_path: "/api/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientOptions {
    /// Build options from the environment (`G3MS_API_URL`).
    pub fn from_env() -> Result<Self, g3ms_core::CoreError> {
        let base_url = g3ms_core::env::get_api_url_from_env()
            .ok_or_else(|| g3ms_core::CoreError::Config("G3MS_API_URL is not set".into()))?;
        Ok(Self {
            base_url,
            ..Default::default()
        })
    }
}

// ─── Session broadcast ─────────────────────────────────────────────

/// Notifies subscribers that the stored session changed (login, signup,
/// token refresh, logout). Carries a monotonically increasing version.
#[derive(Clone)]
pub struct SessionBroadcast {
    sender: Arc<watch::Sender<u64>>,
    receiver: watch::Receiver<u64>,
}

impl SessionBroadcast {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(0u64);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signal that the session has been updated.
    pub fn notify(&self) {
        let current = *self.sender.borrow();
        let _ = self.sender.send(current.wrapping_add(1));
    }

    /// Get a new receiver for this broadcast channel.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }
}

impl Default for SessionBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionBroadcast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBroadcast")
            .field("version", &*self.sender.borrow())
            .finish()
    }
}

// ─── Client ────────────────────────────────────────────────────────

/// Typed async client for the G3MS API.
///
/// Cheap to clone; clones share the HTTP connection pool, token store,
/// and session broadcast.
#[derive(Clone)]
pub struct G3msClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
    tokens: TokenManager,
    broadcast: SessionBroadcast,
}

impl G3msClient {
    /// Create a new client. Tokens persist through `token_store`.
    pub fn new(options: ClientOptions, token_store: Arc<dyn KeyValueStore>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(options.timeout_secs))
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let base_url = format!(
            "{}{}",
            options.base_url.trim_end_matches('/'),
            options.base_path
        );

        Self {
            http,
            base_url,
            tokens: TokenManager::new(token_store),
            broadcast: SessionBroadcast::new(),
            options,
        }
    }

    /// The token manager backing this client.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// The session-change broadcast channel.
    pub fn broadcast(&self) -> &SessionBroadcast {
        &self.broadcast
    }

    /// The options this client was created with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The full base URL (base_url + base_path).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Internal helpers ───────────────────────────────────────────

    /// Build a full URL for the given endpoint path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token to a request, when one is stored.
    async fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.access_token().await {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a GET request and deserialize the response.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let req = self.authorize(self.http.get(self.url(path))).await;
        let resp = req.send().await.map_err(ClientError::network)?;
        Self::handle_response(resp).await
    }

    /// Send a POST request with a JSON body and deserialize the response.
    pub(crate) async fn post<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let req = self.authorize(self.http.post(self.url(path)).json(body)).await;
        let resp = req.send().await.map_err(ClientError::network)?;
        Self::handle_response(resp).await
    }

    /// Send a POST request without a body.
    pub(crate) async fn post_empty<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let req = self.authorize(self.http.post(self.url(path))).await;
        let resp = req.send().await.map_err(ClientError::network)?;
        Self::handle_response(resp).await
    }

    /// Handle an HTTP response, mapping error statuses to [`ClientError`].
    pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();

        if status.is_success() {
            let body = resp.text().await.map_err(ClientError::network)?;
            if body.is_empty() {
                return serde_json::from_str("null").map_err(|e| {
                    ClientError::Deserialization(format!("Empty response: {}", e))
                });
            }
            return serde_json::from_str(&body).map_err(|e| {
                ClientError::Deserialization(format!(
                    "Failed to deserialize response: {} (body: {})",
                    e,
                    if body.len() > 200 {
                        format!("{}...", &body[..200])
                    } else {
                        body
                    }
                ))
            });
        }

        let body = resp.text().await.unwrap_or_else(|_| "Unknown error".into());
        Err(Self::map_error(status.as_u16(), &body))
    }

    /// Map an error status and body to a [`ClientError`] variant.
    ///
    /// The server's error body is `{"error": {"code", "message"}}`; both
    /// fields are optional and fall back to status-derived defaults.
    pub(crate) fn map_error(status: u16, body: &str) -> ClientError {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                let err = v.get("error")?;
                let code = err.get("code")?.as_str()?.to_string();
                let message = err.get("message")?.as_str()?.to_string();
                Some((code, message))
            });

        let code_or = |default: &str| {
            detail
                .as_ref()
                .map(|(c, _)| c.clone())
                .unwrap_or_else(|| default.to_string())
        };
        let message_or = |default: &str| {
            detail
                .as_ref()
                .map(|(_, m)| m.clone())
                .unwrap_or_else(|| default.to_string())
        };

        match status {
            400 => ClientError::BadRequest {
                code: code_or("BAD_REQUEST"),
                message: message_or(body),
            },
            401 => ClientError::Unauthorized {
                code: code_or("UNAUTHORIZED"),
                message: message_or("Unauthorized"),
            },
            403 => ClientError::Forbidden {
                code: code_or("FORBIDDEN"),
                message: message_or("Forbidden"),
            },
            404 => ClientError::NotFound {
                message: message_or("Not found"),
            },
            409 => ClientError::Conflict {
                code: code_or("CONFLICT"),
                message: message_or(body),
            },
            410 => ClientError::Gone {
                code: code_or("GONE"),
                message: message_or("Expired"),
            },
            422 => ClientError::UnprocessableEntity {
                code: code_or("UNPROCESSABLE_ENTITY"),
                message: message_or(body),
            },
            429 => ClientError::TooManyRequests {
                message: message_or("Too many requests"),
            },
            502 => ClientError::BadGateway {
                message: message_or("Upstream provider failed"),
            },
            _ => ClientError::Server {
                status,
                message: message_or(body),
            },
        }
    }
}

impl std::fmt::Debug for G3msClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("G3msClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3ms_core::storage::MemoryStore;

    fn client() -> G3msClient {
        G3msClient::new(
            ClientOptions {
                base_url: "https://api.g3ms.co".into(),
                ..Default::default()
            },
            Arc::new(MemoryStore::new()),
        )
    }

    #[test]
    fn test_default_options() {
        let opts = ClientOptions::default();
        assert_eq!(opts.base_path, "/api/v1");
        assert_eq!(opts.timeout_secs, 30);
    }

    #[test]
    fn test_options_from_env() {
        std::env::remove_var("G3MS_API_URL");
        assert!(ClientOptions::from_env().is_err());

        std::env::set_var("G3MS_API_URL", "https://api.g3ms.co");
        let opts = ClientOptions::from_env().unwrap();
        assert_eq!(opts.base_url, "https://api.g3ms.co");
        std::env::remove_var("G3MS_API_URL");
    }

    #[test]
    fn test_url_building() {
        let client = client();
        assert_eq!(client.base_url(), "https://api.g3ms.co/api/v1");
        assert_eq!(
            client.url("/auth/login"),
            "https://api.g3ms.co/api/v1/auth/login"
        );
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let client = G3msClient::new(
            ClientOptions {
                base_url: "https://api.g3ms.co/".into(),
                ..Default::default()
            },
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(client.base_url(), "https://api.g3ms.co/api/v1");
    }

    #[test]
    fn test_map_error_structured_body() {
        let err = G3msClient::map_error(
            409,
            r#"{"error": {"code": "ROLE_ALREADY_SET", "message": "Role already chosen"}}"#,
        );
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.code(), Some("ROLE_ALREADY_SET"));
        assert_eq!(err.message(), "Role already chosen");
    }

    #[test]
    fn test_map_error_unstructured_body() {
        let err = G3msClient::map_error(429, "slow down");
        assert!(err.is_rate_limited());
        assert_eq!(err.message(), "Too many requests");
    }

    #[test]
    fn test_map_error_gone_and_bad_gateway() {
        assert_eq!(G3msClient::map_error(410, "{}").status(), Some(410));
        assert_eq!(G3msClient::map_error(502, "{}").status(), Some(502));
        assert!(matches!(
            G3msClient::map_error(503, "{}"),
            ClientError::Server { status: 503, .. }
        ));
    }

    #[tokio::test]
    async fn test_session_broadcast_versions() {
        let broadcast = SessionBroadcast::new();
        let mut rx = broadcast.subscribe();
        broadcast.notify();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }
}
