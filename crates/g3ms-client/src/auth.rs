//! Authentication endpoints.
//!
//! Login, signup, and the OAuth exchange all return the same
//! [`AuthResponse`] shape; on success the client persists the token pair
//! and notifies the session broadcast. Logout here is only the server
//! call; clearing local state is the auth flow's job, so it can run
//! unconditionally even when this call fails.

use crate::error::ClientError;
use crate::types::{AuthResponse, Credentials, RefreshResponse, User};
use crate::G3msClient;

impl G3msClient {
    /// Sign in with email and password. `POST /auth/login`.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let resp: AuthResponse = self.post("/auth/login", credentials).await?;
        self.store_session(&resp).await;
        Ok(resp)
    }

    /// Create an account with email and password. `POST /auth/signup`.
    pub async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let resp: AuthResponse = self.post("/auth/signup", credentials).await?;
        self.store_session(&resp).await;
        Ok(resp)
    }

    /// Invalidate the session server-side. `POST /auth/logout`.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post_empty("/auth/logout").await?;
        Ok(())
    }

    /// Exchange the refresh token for a new access token.
    /// `POST /auth/refresh`.
    ///
    /// Fails with [`ClientError::Unauthorized`] when no refresh token is
    /// stored; the server may also rotate the refresh token.
    pub async fn refresh_token(&self) -> Result<RefreshResponse, ClientError> {
        let refresh = self
            .tokens()
            .refresh_token()
            .await
            .ok_or_else(|| ClientError::Unauthorized {
                code: "NO_REFRESH_TOKEN".into(),
                message: "No refresh token stored".into(),
            })?;

        let resp: RefreshResponse = self
            .post("/auth/refresh", &serde_json::json!({ "refreshToken": refresh }))
            .await?;

        if let Err(err) = self.tokens().set_access_token(&resp.access_token).await {
            tracing::warn!(%err, "failed to persist refreshed access token");
        }
        if let Some(ref rotated) = resp.refresh_token {
            if let Err(err) = self
                .tokens()
                .set_tokens(&crate::types::TokenPair {
                    access_token: resp.access_token.clone(),
                    refresh_token: rotated.clone(),
                })
                .await
            {
                tracing::warn!(%err, "failed to persist rotated refresh token");
            }
        }
        self.broadcast().notify();
        Ok(resp)
    }

    /// Fetch the authenticated user's profile. `GET /users/me`.
    pub async fn get_current_user(&self) -> Result<User, ClientError> {
        self.get("/users/me").await
    }

    /// Exchange a Google provider token for first-party tokens.
    /// `POST /auth/google`.
    pub async fn google_auth(&self, token: &str) -> Result<AuthResponse, ClientError> {
        let resp: AuthResponse = self
            .post("/auth/google", &serde_json::json!({ "token": token }))
            .await?;
        self.store_session(&resp).await;
        Ok(resp)
    }

    /// Exchange an Apple provider token for first-party tokens.
    /// `POST /auth/apple`.
    pub async fn apple_auth(&self, token: &str) -> Result<AuthResponse, ClientError> {
        let resp: AuthResponse = self
            .post("/auth/apple", &serde_json::json!({ "token": token }))
            .await?;
        self.store_session(&resp).await;
        Ok(resp)
    }

    async fn store_session(&self, resp: &AuthResponse) {
        let pair = crate::types::TokenPair {
            access_token: resp.access_token.clone(),
            refresh_token: resp.refresh_token.clone(),
        };
        if let Err(err) = self.tokens().set_tokens(&pair).await {
            tracing::warn!(%err, "failed to persist session tokens");
        }
        self.broadcast().notify();
    }
}
