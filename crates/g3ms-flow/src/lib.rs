//! # G3MS Flow
//!
//! The orchestration layer of the G3MS SDK: everything that sequences
//! calls against the onboarding contract and decides what the host UI
//! should show next.
//!
//! - [`AuthFlow`]: process-wide authentication authority covering
//!   login, signup, OAuth continuation, logout, token refresh, and the
//!   post-authentication routing decision.
//! - [`SignupFlow`]: the step wizard driving account creation through
//!   the server-owned onboarding state machine.
//! - [`SessionManager`]: idle-timeout tracking with activity resets.
//! - [`DropDraftStore`]: cross-navigation scratch storage for drop
//!   drafts captured before authentication.
//!
//! Services are explicitly constructed and take their collaborators as
//! arguments (the [`AuthApi`] seam, a [`KeyValueStore`]); nothing here
//! is ambient module state.
//!
//! [`KeyValueStore`]: g3ms_core::storage::KeyValueStore

mod api;
mod auth_flow;
mod routes;
mod scratch;
mod session;
mod signup;

pub use api::AuthApi;
pub use auth_flow::{
    AuthFlow, AuthFlowOptions, AuthState, OAuthProvider, ProviderEvent, ProviderSession,
};
pub use routes::{post_auth_route, LoginReason, Route};
pub use scratch::{DropDraftStore, DropFormData, DROP_DATA_KEY, DROP_FLOW_FLAG_KEY};
pub use session::{SessionEvent, SessionManager, DEFAULT_IDLE_TIMEOUT};
pub use signup::{SignupFlow, SignupForm, SignupStep};
