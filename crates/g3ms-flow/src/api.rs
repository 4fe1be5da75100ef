// The seam between the flow services and the HTTP client.
//
// `G3msClient` is the production implementation; tests inject fakes
// that script responses and count calls.

use async_trait::async_trait;
use chrono::NaiveDate;
use g3ms_client::{
    AuthResponse, ClientError, Credentials, G3msClient, GuardianRequest, OnboardingStatus,
    RefreshResponse, User, UserRole,
};

/// The API surface the flow services depend on.
///
/// A strict subset of [`G3msClient`]: just the operations the auth flow
/// and signup wizard orchestrate. Mutating onboarding calls return
/// unit, since the flow never inspects their bodies, only the refreshed
/// onboarding status afterwards.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;
    async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;
    async fn logout(&self) -> Result<(), ClientError>;
    async fn refresh_token(&self) -> Result<RefreshResponse, ClientError>;
    async fn get_current_user(&self) -> Result<User, ClientError>;
    async fn google_auth(&self, token: &str) -> Result<AuthResponse, ClientError>;
    async fn apple_auth(&self, token: &str) -> Result<AuthResponse, ClientError>;

    async fn get_onboarding_status(&self) -> Result<OnboardingStatus, ClientError>;
    async fn set_role(&self, role: UserRole) -> Result<(), ClientError>;
    async fn set_birthdate(&self, birthdate: NaiveDate) -> Result<(), ClientError>;
    async fn send_phone_otp(&self, phone: &str) -> Result<(), ClientError>;
    async fn verify_phone_otp(&self, phone: &str, code: &str) -> Result<(), ClientError>;
    async fn create_guardian_request(&self, request: &GuardianRequest) -> Result<(), ClientError>;
}

#[async_trait]
impl AuthApi for G3msClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        G3msClient::login(self, credentials).await
    }

    async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        G3msClient::signup(self, credentials).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        G3msClient::logout(self).await
    }

    async fn refresh_token(&self) -> Result<RefreshResponse, ClientError> {
        G3msClient::refresh_token(self).await
    }

    async fn get_current_user(&self) -> Result<User, ClientError> {
        G3msClient::get_current_user(self).await
    }

    async fn google_auth(&self, token: &str) -> Result<AuthResponse, ClientError> {
        G3msClient::google_auth(self, token).await
    }

    async fn apple_auth(&self, token: &str) -> Result<AuthResponse, ClientError> {
        G3msClient::apple_auth(self, token).await
    }

    async fn get_onboarding_status(&self) -> Result<OnboardingStatus, ClientError> {
        G3msClient::get_onboarding_status(self).await
    }

    async fn set_role(&self, role: UserRole) -> Result<(), ClientError> {
        G3msClient::set_role(self, role).await.map(|_| ())
    }

    async fn set_birthdate(&self, birthdate: NaiveDate) -> Result<(), ClientError> {
        G3msClient::set_birthdate(self, birthdate).await.map(|_| ())
    }

    async fn send_phone_otp(&self, phone: &str) -> Result<(), ClientError> {
        G3msClient::send_phone_otp(self, phone).await.map(|_| ())
    }

    async fn verify_phone_otp(&self, phone: &str, code: &str) -> Result<(), ClientError> {
        G3msClient::verify_phone_otp(self, phone, code)
            .await
            .map(|_| ())
    }

    async fn create_guardian_request(&self, request: &GuardianRequest) -> Result<(), ClientError> {
        G3msClient::create_guardian_request(self, request)
            .await
            .map(|_| ())
    }
}
