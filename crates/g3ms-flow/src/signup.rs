//! The signup step wizard.
//!
//! A thin view over the server-owned onboarding state machine: after
//! every successful mutating step the wizard re-fetches the onboarding
//! status and maps it to a screen, never assuming the next step itself.
//! The one exception is the under-13 branch, where the client computes
//! age locally and forces the guardian path, a COPPA UX concern
//! layered on top of the server's own guardian gating.

use std::sync::{Arc, OnceLock};

use chrono::{NaiveDate, Utc};
use g3ms_client::{ClientError, Credentials, GuardianRequest, OnboardingState, UserRole};
use g3ms_core::util::date;
use regex::Regex;

use crate::api::AuthApi;

/// Youngest age that can finish signup without guardian consent.
const MIN_SELF_SERVE_AGE: i32 = 13;

// ─── Steps ──────────────────────────────────────────────────────────

/// The wizard's view state. Not persisted; reconstructed from the
/// server's onboarding state via [`SignupStep::for_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStep {
    EmailPassword,
    UserType,
    Birthdate,
    AgeVerification,
    PhoneNumber,
    PhoneVerification,
    GuardianInfo,
    GuardianPending,
    Complete,
}

impl SignupStep {
    /// Map a server onboarding state to the screen that serves it.
    /// Unrecognized states fall back to role selection.
    pub fn for_state(state: OnboardingState) -> Self {
        match state {
            OnboardingState::Ready => Self::Complete,
            OnboardingState::PendingRole => Self::UserType,
            OnboardingState::PendingBirthdate => Self::Birthdate,
            OnboardingState::PendingPhoneVerification => Self::PhoneNumber,
            OnboardingState::PendingGuardianInfo => Self::GuardianPending,
            OnboardingState::Unknown => Self::UserType,
        }
    }

    /// The step back navigation returns to. Local-only; going back
    /// never touches already-submitted server state.
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::EmailPassword => None,
            Self::UserType => Some(Self::EmailPassword),
            Self::Birthdate => Some(Self::UserType),
            Self::AgeVerification => Some(Self::Birthdate),
            Self::PhoneNumber => Some(Self::Birthdate),
            Self::PhoneVerification => Some(Self::PhoneNumber),
            Self::GuardianInfo => Some(Self::AgeVerification),
            Self::GuardianPending => Some(Self::GuardianInfo),
            Self::Complete => None,
        }
    }
}

/// Steps an adult visits, in order.
const ADULT_PATH: [SignupStep; 6] = [
    SignupStep::EmailPassword,
    SignupStep::UserType,
    SignupStep::Birthdate,
    SignupStep::PhoneNumber,
    SignupStep::PhoneVerification,
    SignupStep::Complete,
];

/// Steps an under-13 user visits, in order. Phone verification is
/// replaced by the guardian consent path.
const MINOR_PATH: [SignupStep; 7] = [
    SignupStep::EmailPassword,
    SignupStep::UserType,
    SignupStep::Birthdate,
    SignupStep::AgeVerification,
    SignupStep::GuardianInfo,
    SignupStep::GuardianPending,
    SignupStep::Complete,
];

// ─── Form state ─────────────────────────────────────────────────────

/// Field values collected across the wizard.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
    /// Raw `YYYY-MM-DD` input.
    pub birthdate: String,
    pub phone: String,
    pub code: String,
    pub student_first_name: String,
    pub student_last_name: String,
    pub parent_first_name: String,
    pub parent_last_name: String,
    pub parent_phone: String,
}

// ─── User-facing copy ───────────────────────────────────────────────

const COPY_GENERIC: &str = "Something went wrong. Please try again.";
const COPY_EMAIL_EXISTS: &str = "An account with this email already exists. Try signing in instead.";
const COPY_WEAK_CREDENTIALS: &str =
    "Enter a valid email and a password of at least 8 characters.";
const COPY_ROLE_ALREADY_SET: &str = "A role is already set for this account.";
const COPY_ROLE_INVALID: &str = "That role isn't available.";
const COPY_BIRTHDATE_ALREADY_SET: &str = "A birthdate is already set for this account.";
const COPY_BIRTHDATE_INVALID: &str = "Enter a valid birthdate.";
const COPY_PHONE_INVALID: &str = "Enter a valid phone number.";
const COPY_RATE_LIMITED: &str = "Too many attempts. Please wait a few minutes and try again.";
const COPY_SMS_FAILED: &str = "We couldn't send the text message. Please try again shortly.";
const COPY_CODE_INVALID_OR_EXPIRED: &str =
    "That code is invalid or has expired. Request a new one.";
const COPY_PHONE_IN_USE: &str = "That phone number is already linked to another account.";
const COPY_CODE_FORMAT: &str = "Enter the 6-digit code from the text message.";
const COPY_GUARDIAN_INVALID: &str = "Check the guardian details and try again.";
const COPY_SESSION_EXPIRED: &str = "Your session expired. Please sign in again.";

fn validation_copy(step: SignupStep) -> &'static str {
    match step {
        SignupStep::EmailPassword => COPY_WEAK_CREDENTIALS,
        SignupStep::UserType => "Choose how you'll use G3MS.",
        SignupStep::Birthdate => COPY_BIRTHDATE_INVALID,
        SignupStep::PhoneNumber => COPY_PHONE_INVALID,
        SignupStep::PhoneVerification => COPY_CODE_FORMAT,
        SignupStep::GuardianInfo => "Fill in every guardian field.",
        _ => COPY_GENERIC,
    }
}

/// Map a server rejection to the copy shown inline at the step where
/// it happened. Anything unexpected gets the generic retry message.
fn error_copy(step: SignupStep, err: &ClientError) -> &'static str {
    match (step, err) {
        (SignupStep::EmailPassword, ClientError::Conflict { .. }) => COPY_EMAIL_EXISTS,
        (SignupStep::EmailPassword, ClientError::UnprocessableEntity { .. }) => {
            COPY_WEAK_CREDENTIALS
        }
        (SignupStep::UserType, ClientError::Conflict { .. }) => COPY_ROLE_ALREADY_SET,
        (SignupStep::UserType, ClientError::UnprocessableEntity { .. }) => COPY_ROLE_INVALID,
        (SignupStep::Birthdate, ClientError::Conflict { .. }) => COPY_BIRTHDATE_ALREADY_SET,
        (SignupStep::Birthdate, ClientError::UnprocessableEntity { .. }) => {
            COPY_BIRTHDATE_INVALID
        }
        (SignupStep::PhoneNumber, ClientError::UnprocessableEntity { .. }) => COPY_PHONE_INVALID,
        (
            SignupStep::PhoneNumber | SignupStep::GuardianInfo,
            ClientError::TooManyRequests { .. },
        ) => COPY_RATE_LIMITED,
        (
            SignupStep::PhoneNumber | SignupStep::GuardianInfo,
            ClientError::BadGateway { .. },
        ) => COPY_SMS_FAILED,
        (
            SignupStep::PhoneVerification,
            ClientError::BadRequest { .. } | ClientError::Gone { .. },
        ) => COPY_CODE_INVALID_OR_EXPIRED,
        (SignupStep::PhoneVerification, ClientError::Conflict { .. }) => COPY_PHONE_IN_USE,
        (SignupStep::PhoneVerification, ClientError::UnprocessableEntity { .. }) => {
            COPY_CODE_FORMAT
        }
        (SignupStep::GuardianInfo, ClientError::UnprocessableEntity { .. }) => {
            COPY_GUARDIAN_INVALID
        }
        _ => COPY_GENERIC,
    }
}

fn email_is_valid(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
        .is_match(email)
}

// ─── Wizard ─────────────────────────────────────────────────────────

/// The signup wizard state machine.
///
/// Owned by the host screen; not shared. Each `handle_next` validates
/// the current step, submits it, and moves to whatever step the server
/// says comes next.
pub struct SignupFlow {
    api: Arc<dyn AuthApi>,
    step: SignupStep,
    form: SignupForm,
    error: Option<String>,
    loading: bool,
    /// Set once the birthdate puts the user under 13; switches the
    /// wizard onto the guardian path.
    minor: bool,
    today: NaiveDate,
}

impl SignupFlow {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self {
            api,
            step: SignupStep::EmailPassword,
            form: SignupForm::default(),
            error: None,
            loading: false,
            minor: false,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin "today" for age computation. Test hook.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn step(&self) -> SignupStep {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_minor(&self) -> bool {
        self.minor
    }

    pub fn form(&self) -> &SignupForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SignupForm {
        &mut self.form
    }

    /// Whether the current step's inputs pass the client-side checks.
    /// A UX guard only; the server re-validates everything.
    pub fn is_step_valid(&self) -> bool {
        match self.step {
            SignupStep::EmailPassword => {
                email_is_valid(&self.form.email) && self.form.password.len() >= 8
            }
            SignupStep::UserType => self.form.role.is_some(),
            SignupStep::Birthdate => match date::parse_date(&self.form.birthdate) {
                Some(birthdate) => !date::is_future(birthdate, self.today),
                None => false,
            },
            SignupStep::AgeVerification => true,
            SignupStep::PhoneNumber => !self.form.phone.trim().is_empty(),
            // Length check only; character class is left to the server.
            SignupStep::PhoneVerification => self.form.code.len() == 6,
            SignupStep::GuardianInfo => {
                let f = &self.form;
                [
                    &f.student_first_name,
                    &f.student_last_name,
                    &f.parent_first_name,
                    &f.parent_last_name,
                    &f.parent_phone,
                ]
                .iter()
                .all(|field| !field.trim().is_empty())
            }
            SignupStep::GuardianPending | SignupStep::Complete => true,
        }
    }

    /// Submit the current step and move to the next one. Re-entry while
    /// a submission is in flight is a no-op; validation and server
    /// errors land in [`error`](Self::error) and keep the step.
    pub async fn handle_next(&mut self) -> SignupStep {
        if self.loading {
            return self.step;
        }
        if !self.is_step_valid() {
            self.error = Some(validation_copy(self.step).to_string());
            return self.step;
        }

        self.error = None;
        self.loading = true;
        let outcome = self.submit_current_step().await;
        self.loading = false;

        match outcome {
            Ok(next) => self.step = next,
            Err(err) => self.apply_error(err),
        }
        self.step
    }

    /// Re-fetch the onboarding status and jump to the step serving it.
    /// The single authority for "what screen comes next"; also the
    /// guardian-pending poll.
    pub async fn advance(&mut self) -> SignupStep {
        match self.advance_from_server().await {
            Ok(next) => {
                self.error = None;
                self.step = next;
            }
            Err(err) => self.apply_error(err),
        }
        self.step
    }

    /// Local-only back navigation.
    pub fn back(&mut self) -> SignupStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
            self.error = None;
        }
        self.step
    }

    /// Fraction of the user's actual step path completed. Minors get
    /// the guardian path, adults the phone path.
    pub fn progress(&self) -> f32 {
        let path = self.step_path();
        let position = path.iter().position(|s| *s == self.step).unwrap_or(0);
        (position + 1) as f32 / path.len() as f32
    }

    fn step_path(&self) -> &'static [SignupStep] {
        let on_guardian_path = self.minor
            || matches!(
                self.step,
                SignupStep::AgeVerification
                    | SignupStep::GuardianInfo
                    | SignupStep::GuardianPending
            );
        if on_guardian_path {
            &MINOR_PATH
        } else {
            &ADULT_PATH
        }
    }

    async fn submit_current_step(&mut self) -> Result<SignupStep, ClientError> {
        match self.step {
            SignupStep::EmailPassword => {
                let credentials = Credentials {
                    email: self.form.email.clone(),
                    password: self.form.password.clone(),
                };
                self.api.signup(&credentials).await?;
                self.advance_from_server().await
            }
            SignupStep::UserType => {
                let Some(role) = self.form.role else {
                    return Ok(self.step);
                };
                self.api.set_role(role).await?;
                self.advance_from_server().await
            }
            SignupStep::Birthdate => {
                let Some(birthdate) = date::parse_date(&self.form.birthdate) else {
                    return Ok(self.step);
                };
                self.api.set_birthdate(birthdate).await?;
                if date::age_on(birthdate, self.today) < MIN_SELF_SERVE_AGE {
                    self.minor = true;
                    Ok(SignupStep::AgeVerification)
                } else {
                    self.advance_from_server().await
                }
            }
            SignupStep::AgeVerification => Ok(SignupStep::GuardianInfo),
            SignupStep::PhoneNumber => {
                self.api.send_phone_otp(&self.form.phone).await?;
                Ok(SignupStep::PhoneVerification)
            }
            SignupStep::PhoneVerification => {
                self.api
                    .verify_phone_otp(&self.form.phone, &self.form.code)
                    .await?;
                self.advance_from_server().await
            }
            SignupStep::GuardianInfo => {
                let request = GuardianRequest {
                    student_first_name: self.form.student_first_name.clone(),
                    student_last_name: self.form.student_last_name.clone(),
                    parent_first_name: self.form.parent_first_name.clone(),
                    parent_last_name: self.form.parent_last_name.clone(),
                    parent_phone: self.form.parent_phone.clone(),
                };
                self.api.create_guardian_request(&request).await?;
                Ok(SignupStep::Complete)
            }
            SignupStep::GuardianPending => self.advance_from_server().await,
            SignupStep::Complete => Ok(SignupStep::Complete),
        }
    }

    async fn advance_from_server(&self) -> Result<SignupStep, ClientError> {
        let status = self.api.get_onboarding_status().await?;
        Ok(SignupStep::for_state(status.state))
    }

    fn apply_error(&mut self, err: ClientError) {
        if err.is_unauthorized() {
            // The session died mid-flow; restart from credential capture.
            tracing::warn!(%err, "unauthorized mid-signup, resetting wizard");
            self.step = SignupStep::EmailPassword;
            self.error = Some(COPY_SESSION_EXPIRED.to_string());
            return;
        }
        tracing::debug!(%err, step = ?self.step, "signup step rejected");
        self.error = Some(error_copy(self.step, &err).to_string());
    }
}

impl std::fmt::Debug for SignupFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupFlow")
            .field("step", &self.step)
            .field("loading", &self.loading)
            .field("minor", &self.minor)
            .finish()
    }
}
