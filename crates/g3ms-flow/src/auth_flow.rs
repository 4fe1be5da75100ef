//! Process-wide authentication authority.
//!
//! Owns the user snapshot, the login/signup/OAuth/logout/refresh
//! operations, and the post-authentication routing decision. The
//! onboarding state machine itself lives on the server; this flow only
//! fetches it and maps it to a [`Route`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use g3ms_client::{ClientError, Credentials, TokenManager, User};
use g3ms_core::storage::KeyValueStore;
use tokio::sync::RwLock;

use crate::api::AuthApi;
use crate::routes::{post_auth_route, Route};
use crate::session::{SessionManager, DEFAULT_IDLE_TIMEOUT};

/// Storage key for the signup intent persisted across the OAuth
/// redirect. The redirect discards in-memory state, so the intent must
/// survive the process boundary and be restored in the callback.
pub const OAUTH_SIGNUP_INTENT_KEY: &str = "g3ms_oauth_signup_intent";

/// Supported external OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Apple,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }
}

/// The provider-side session delivered to the callback route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub provider: OAuthProvider,
    /// The provider's token, exchanged with the backend for first-party
    /// tokens.
    pub token: String,
}

/// Session-change notifications from the external OAuth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    SignedIn(ProviderSession),
    TokenRefreshed,
    SignedOut,
}

/// Read-only snapshot of the authentication state.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            // Loading until `initialize` resolves the persisted session.
            is_loading: true,
        }
    }
}

/// Construction options for [`AuthFlow`].
#[derive(Debug, Clone)]
pub struct AuthFlowOptions {
    /// Idle window before the session is forcibly ended.
    pub idle_timeout: Duration,
}

impl Default for AuthFlowOptions {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Releases the `auth_processing` flag when a post-auth run finishes.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl<'a> ProcessingGuard<'a> {
    /// `None` when a run is already in flight.
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Process-wide authentication state and operations.
pub struct AuthFlow {
    api: Arc<dyn AuthApi>,
    tokens: TokenManager,
    intents: Arc<dyn KeyValueStore>,
    session: SessionManager,
    state: RwLock<AuthState>,
    auth_processing: AtomicBool,
    /// Last provider token already exchanged, for deduplicating
    /// repeated `SignedIn` notifications.
    last_provider_token: Mutex<Option<String>>,
}

impl AuthFlow {
    pub fn new(
        api: Arc<dyn AuthApi>,
        token_store: Arc<dyn KeyValueStore>,
        intent_store: Arc<dyn KeyValueStore>,
        options: AuthFlowOptions,
    ) -> Self {
        let tokens = TokenManager::new(token_store);
        let session = SessionManager::new(tokens.clone(), options.idle_timeout);
        Self {
            api,
            tokens,
            intents: intent_store,
            session,
            state: RwLock::new(AuthState::default()),
            auth_processing: AtomicBool::new(false),
            last_provider_token: Mutex::new(None),
        }
    }

    /// A snapshot of the current authentication state.
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// The idle-session manager owned by this flow.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The token manager backing this flow.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Cold-start initialization: validate a persisted access token by
    /// fetching the current user. Adopts the user on success, clears
    /// all auth state on failure. Never errors, never loops.
    pub async fn initialize(&self) {
        self.state.write().await.is_loading = true;

        if self.tokens.access_token().await.is_some() {
            match self.api.get_current_user().await {
                Ok(user) => {
                    {
                        let mut state = self.state.write().await;
                        state.user = Some(user);
                        state.is_authenticated = true;
                        state.is_loading = false;
                    }
                    self.session.start();
                    return;
                }
                Err(err) => {
                    tracing::warn!(%err, "stored token rejected, clearing auth state");
                    self.clear_auth_state().await;
                }
            }
        }

        self.state.write().await.is_loading = false;
    }

    /// Sign in with email and password, then run the post-auth flow.
    /// On failure, auth state is cleared and the error propagates so
    /// the host can show it.
    pub async fn login(&self, credentials: &Credentials) -> Result<Route, ClientError> {
        self.authenticate(credentials, false).await
    }

    /// Create an account, then run the post-auth flow.
    pub async fn signup(&self, credentials: &Credentials) -> Result<Route, ClientError> {
        self.authenticate(credentials, true).await
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
        is_from_signup: bool,
    ) -> Result<Route, ClientError> {
        self.state.write().await.is_loading = true;

        let result = if is_from_signup {
            self.api.signup(credentials).await
        } else {
            self.api.login(credentials).await
        };

        match result {
            Ok(_) => Ok(self
                .post_auth(is_from_signup)
                .await
                .unwrap_or(Route::Dashboard)),
            Err(err) => {
                self.clear_auth_state().await;
                Err(err)
            }
        }
    }

    /// Begin a Google redirect sign-in. Persists the signup intent so
    /// the callback can recover it; does not itself create a session.
    pub async fn google_login(&self, is_from_signup: bool) {
        self.begin_oauth(OAuthProvider::Google, is_from_signup).await;
    }

    /// Begin an Apple redirect sign-in.
    pub async fn apple_login(&self, is_from_signup: bool) {
        self.begin_oauth(OAuthProvider::Apple, is_from_signup).await;
    }

    async fn begin_oauth(&self, provider: OAuthProvider, is_from_signup: bool) {
        let intent = if is_from_signup { "true" } else { "false" };
        if let Err(err) = self.intents.set(OAUTH_SIGNUP_INTENT_KEY, intent).await {
            tracing::warn!(%err, "failed to persist oauth signup intent");
        }
        tracing::debug!(provider = provider.as_str(), "starting oauth redirect");
    }

    /// Handle the OAuth redirect landing: exchange the provider session
    /// with the backend (endpoint chosen by provider name), recover the
    /// stored signup intent, and run the post-auth flow.
    pub async fn handle_auth_callback(
        &self,
        session: &ProviderSession,
    ) -> Result<Route, ClientError> {
        self.exchange_provider_session(session)
            .await
            .map(|route| route.unwrap_or(Route::Dashboard))
    }

    /// Handle a session-change notification from the OAuth provider.
    ///
    /// Dedup rules: a `TokenRefreshed` while already authenticated is
    /// ignored; a `SignedIn` whose token was already exchanged is
    /// ignored. Returns the route to navigate to, or `None` when the
    /// event was a no-op.
    pub async fn handle_provider_event(&self, event: &ProviderEvent) -> Option<Route> {
        match event {
            ProviderEvent::TokenRefreshed => {
                if self.state.read().await.is_authenticated {
                    tracing::debug!("ignoring provider token refresh, already authenticated");
                }
                None
            }
            ProviderEvent::SignedOut => {
                self.clear_auth_state().await;
                None
            }
            ProviderEvent::SignedIn(session) => {
                if self.already_exchanged(&session.token) {
                    tracing::debug!("ignoring duplicate signed-in notification");
                    return None;
                }
                match self.exchange_provider_session(session).await {
                    Ok(route) => route,
                    Err(err) => {
                        tracing::warn!(%err, "provider sign-in exchange failed");
                        None
                    }
                }
            }
        }
    }

    /// Exchange a provider session for first-party tokens. `Ok(None)`
    /// means another post-auth run was already in flight.
    async fn exchange_provider_session(
        &self,
        session: &ProviderSession,
    ) -> Result<Option<Route>, ClientError> {
        let exchanged = match session.provider {
            OAuthProvider::Google => self.api.google_auth(&session.token).await,
            OAuthProvider::Apple => self.api.apple_auth(&session.token).await,
        };

        match exchanged {
            Ok(_) => {
                *self.last_provider_token.lock().unwrap() = Some(session.token.clone());
                let is_from_signup = self.take_signup_intent().await;
                Ok(self.post_auth(is_from_signup).await)
            }
            Err(err) => {
                self.clear_auth_state().await;
                Err(err)
            }
        }
    }

    fn already_exchanged(&self, token: &str) -> bool {
        self.last_provider_token.lock().unwrap().as_deref() == Some(token)
    }

    /// Consume the persisted signup intent. Absent or unreadable
    /// intents count as a plain sign-in.
    async fn take_signup_intent(&self) -> bool {
        match self.intents.get(OAUTH_SIGNUP_INTENT_KEY).await {
            Ok(Some(value)) => {
                if let Err(err) = self.intents.remove(OAUTH_SIGNUP_INTENT_KEY).await {
                    tracing::warn!(%err, "failed to consume oauth signup intent");
                }
                value == "true"
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(%err, "failed to read oauth signup intent");
                false
            }
        }
    }

    /// Best-effort server-side invalidation, then unconditional local
    /// cleanup. Idempotent; never fails.
    pub async fn logout(&self) {
        if self.tokens.access_token().await.is_some() {
            if let Err(err) = self.api.logout().await {
                tracing::warn!(%err, "server-side logout failed, clearing local state anyway");
            }
        }
        self.clear_auth_state().await;
    }

    /// Exchange the refresh token for a new access token; a failed
    /// refresh forces a logout.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        match self.api.refresh_token().await {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!(%err, "token refresh failed, logging out");
                self.logout().await;
                Err(err)
            }
        }
    }

    /// The post-authentication decision procedure. Fetches the profile
    /// and onboarding status concurrently, updates the cached user, and
    /// maps the result to a route. `None` means a run was already in
    /// flight (re-entrancy no-op). Fetch failures fall back to the
    /// generic dashboard so the user is never left stuck after
    /// authenticating.
    async fn post_auth(&self, is_from_signup: bool) -> Option<Route> {
        let _guard = match ProcessingGuard::acquire(&self.auth_processing) {
            Some(guard) => guard,
            None => {
                tracing::debug!("post-auth flow already running, ignoring trigger");
                return None;
            }
        };

        let (user_res, status_res) =
            tokio::join!(self.api.get_current_user(), self.api.get_onboarding_status());

        let route = match (&user_res, &status_res) {
            (Ok(user), Ok(status)) => {
                Some(post_auth_route(status.state, is_from_signup, user.role))
            }
            _ => None,
        };

        {
            let mut state = self.state.write().await;
            if let Ok(user) = user_res {
                state.user = Some(user);
            }
            state.is_authenticated = true;
            state.is_loading = false;
        }
        self.session.start();

        Some(route.unwrap_or_else(|| {
            tracing::warn!("post-auth fetch failed, falling back to dashboard");
            Route::Dashboard
        }))
    }

    /// Clear every piece of local auth state: tokens, user snapshot,
    /// idle timer, provider dedup marker. Safe to call repeatedly.
    async fn clear_auth_state(&self) {
        self.tokens.clear().await;
        self.session.end();
        *self.last_provider_token.lock().unwrap() = None;

        let mut state = self.state.write().await;
        state.user = None;
        state.is_authenticated = false;
        state.is_loading = false;
    }
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow")
            .field("auth_processing", &self.auth_processing)
            .finish()
    }
}
