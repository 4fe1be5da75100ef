//! Request and response types for the G3MS API.
//!
//! Wire shapes use camelCase field names. Well-known shapes are typed;
//! loosely-structured payloads carry a flattened `extra` map so new
//! server fields never break deserialization.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Identity ───────────────────────────────────────────────────────

/// Account role assigned during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Educator,
    Brand,
    Creator,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Educator => "educator",
            Self::Brand => "brand",
            Self::Creator => "creator",
        }
    }
}

/// Server-owned onboarding state.
///
/// The canonical "what comes next" authority. Clients re-fetch it after
/// every mutating onboarding call and on cold start; it is never cached
/// across page loads as ground truth. Unknown values deserialize into
/// [`OnboardingState::Unknown`] so new server states don't break old
/// clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingState {
    Ready,
    PendingRole,
    PendingBirthdate,
    PendingPhoneVerification,
    PendingGuardianInfo,
    #[serde(other)]
    Unknown,
}

/// The authenticated user, as returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_state: Option<OnboardingState>,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

// ─── Authentication ─────────────────────────────────────────────────

/// Credentials for `POST /auth/login` and `POST /auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Access/refresh token pair held by the token manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response from login, signup, and the OAuth exchange endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Response from `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    /// Present when the server rotates refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

// ─── Onboarding ─────────────────────────────────────────────────────

/// Response from `GET /onboarding/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingStatus {
    pub state: OnboardingState,
}

/// Request body for `POST /onboarding/birthdate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthdateRequest {
    pub birthdate: NaiveDate,
}

/// Request body for `POST /onboarding/guardian-request`.
///
/// All five fields are required; the server sends the consent SMS to the
/// parent phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianRequest {
    pub student_first_name: String,
    pub student_last_name: String,
    pub parent_first_name: String,
    pub parent_last_name: String,
    pub parent_phone: String,
}

// ─── Drops & lookups ────────────────────────────────────────────────

/// A reusable drop template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTemplate {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A hosted lesson video available for drops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropVideo {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A subject topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
}

/// A school in the lookup directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A grade level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: String,
    pub name: String,
}

/// An educator's drop, as listed on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drop {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for `POST /drops`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDropRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rti_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_goal: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
