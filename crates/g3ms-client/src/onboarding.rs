//! Onboarding endpoints.
//!
//! The server owns the onboarding state machine; every mutating call
//! here is followed (by the flow layer) with a fresh
//! [`get_onboarding_status`](G3msClient::get_onboarding_status); the
//! client never assumes what the next step is.

use chrono::NaiveDate;

use crate::error::ClientError;
use crate::types::{BirthdateRequest, GuardianRequest, OnboardingStatus, UserRole};
use crate::G3msClient;

impl G3msClient {
    /// The canonical next onboarding step. `GET /onboarding/status`.
    pub async fn get_onboarding_status(&self) -> Result<OnboardingStatus, ClientError> {
        self.get("/onboarding/status").await
    }

    /// Choose the account role. `POST /onboarding/role`.
    ///
    /// 409 when a role is already set, 422 for an invalid role.
    pub async fn set_role(&self, role: UserRole) -> Result<serde_json::Value, ClientError> {
        self.post("/onboarding/role", &serde_json::json!({ "role": role }))
            .await
    }

    /// Record the user's birthdate. `POST /onboarding/birthdate`.
    ///
    /// 409 when already set, 422 for an invalid date.
    pub async fn set_birthdate(&self, birthdate: NaiveDate) -> Result<serde_json::Value, ClientError> {
        self.post("/onboarding/birthdate", &BirthdateRequest { birthdate })
            .await
    }

    /// Send a one-time code to the given phone number.
    /// `POST /onboarding/phone/send-otp`.
    ///
    /// 422 invalid number, 429 rate-limited, 502 SMS delivery failure.
    pub async fn send_phone_otp(&self, phone: &str) -> Result<serde_json::Value, ClientError> {
        self.post(
            "/onboarding/phone/send-otp",
            &serde_json::json!({ "phone": phone }),
        )
        .await
    }

    /// Verify the one-time code. `POST /onboarding/phone/verify-otp`.
    ///
    /// 400/410 invalid-or-expired code, 409 phone already in use,
    /// 422 malformed code.
    pub async fn verify_phone_otp(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.post(
            "/onboarding/phone/verify-otp",
            &serde_json::json!({ "phone": phone, "code": code }),
        )
        .await
    }

    /// Request guardian consent for an under-13 student.
    /// `POST /onboarding/guardian-request`.
    ///
    /// The server texts the parent; the student waits on
    /// `PENDING_GUARDIAN_INFO` until approval. 422 invalid fields,
    /// 429 rate-limited, 502 SMS delivery failure.
    pub async fn create_guardian_request(
        &self,
        request: &GuardianRequest,
    ) -> Result<serde_json::Value, ClientError> {
        self.post("/onboarding/guardian-request", request).await
    }

    /// Approve a pending guardian request from the consent link.
    /// `POST /guardian/approve/{approval_id}`.
    pub async fn approve_guardian_request(
        &self,
        approval_id: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.post_empty(&format!("/guardian/approve/{}", approval_id))
            .await
    }
}
