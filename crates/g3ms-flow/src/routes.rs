// Client-side routes and the post-authentication routing decision.

use g3ms_client::{OnboardingState, UserRole};

/// Why the user landed on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReason {
    /// The idle-session timer expired.
    Timeout,
}

/// Client-side routes the flow services navigate between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login { reason: Option<LoginReason> },
    Signup,
    AuthCallback,
    OnboardingRole,
    OnboardingBirthdate,
    OnboardingPhone,
    OnboardingGuardian,
    GuardianApprove { approval_id: String },
    Dashboard,
    DashboardDrops,
    DashboardProfile,
}

impl Route {
    /// The login route with the idle-timeout marker.
    pub fn login_timeout() -> Self {
        Self::Login {
            reason: Some(LoginReason::Timeout),
        }
    }

    /// Render the route as a path, including query markers.
    pub fn path(&self) -> String {
        match self {
            Self::Login { reason: None } => "/login".into(),
            Self::Login {
                reason: Some(LoginReason::Timeout),
            } => "/login?reason=timeout".into(),
            Self::Signup => "/signup".into(),
            Self::AuthCallback => "/auth/callback".into(),
            Self::OnboardingRole => "/onboarding/role".into(),
            Self::OnboardingBirthdate => "/onboarding/birthdate".into(),
            Self::OnboardingPhone => "/onboarding/phone".into(),
            Self::OnboardingGuardian => "/onboarding/guardian".into(),
            Self::GuardianApprove { approval_id } => {
                format!("/guardian/approve/{}", approval_id)
            }
            Self::Dashboard => "/dashboard".into(),
            Self::DashboardDrops => "/dashboard/drops".into(),
            Self::DashboardProfile => "/dashboard/profile".into(),
        }
    }
}

/// Where to send the user after authentication.
///
/// `Ready` from a fresh signup lands on the generic dashboard (welcome
/// screen); a returning user goes straight to their role home. A
/// pending state routes to the matching onboarding screen. Unknown
/// states fall back to the dashboard so the user is never stranded.
pub fn post_auth_route(
    state: OnboardingState,
    is_from_signup: bool,
    role: Option<UserRole>,
) -> Route {
    match state {
        OnboardingState::Ready => {
            if is_from_signup {
                Route::Dashboard
            } else {
                match role {
                    Some(UserRole::Student) | Some(UserRole::Educator) => Route::DashboardDrops,
                    Some(UserRole::Brand) | Some(UserRole::Creator) => Route::DashboardProfile,
                    None => Route::Dashboard,
                }
            }
        }
        OnboardingState::PendingRole => Route::OnboardingRole,
        OnboardingState::PendingBirthdate => Route::OnboardingBirthdate,
        OnboardingState::PendingPhoneVerification => Route::OnboardingPhone,
        OnboardingState::PendingGuardianInfo => Route::OnboardingGuardian,
        OnboardingState::Unknown => Route::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_from_signup_lands_on_dashboard() {
        for role in [
            None,
            Some(UserRole::Student),
            Some(UserRole::Educator),
            Some(UserRole::Brand),
            Some(UserRole::Creator),
        ] {
            assert_eq!(
                post_auth_route(OnboardingState::Ready, true, role),
                Route::Dashboard
            );
        }
    }

    #[test]
    fn test_ready_returning_routes_by_role() {
        assert_eq!(
            post_auth_route(OnboardingState::Ready, false, Some(UserRole::Student)),
            Route::DashboardDrops
        );
        assert_eq!(
            post_auth_route(OnboardingState::Ready, false, Some(UserRole::Educator)),
            Route::DashboardDrops
        );
        assert_eq!(
            post_auth_route(OnboardingState::Ready, false, Some(UserRole::Brand)),
            Route::DashboardProfile
        );
        assert_eq!(
            post_auth_route(OnboardingState::Ready, false, Some(UserRole::Creator)),
            Route::DashboardProfile
        );
        assert_eq!(
            post_auth_route(OnboardingState::Ready, false, None),
            Route::Dashboard
        );
    }

    #[test]
    fn test_pending_states_route_to_onboarding() {
        // The signup flag doesn't change pending-state routing.
        for from_signup in [false, true] {
            assert_eq!(
                post_auth_route(OnboardingState::PendingRole, from_signup, None),
                Route::OnboardingRole
            );
            assert_eq!(
                post_auth_route(OnboardingState::PendingBirthdate, from_signup, None),
                Route::OnboardingBirthdate
            );
            assert_eq!(
                post_auth_route(
                    OnboardingState::PendingPhoneVerification,
                    from_signup,
                    None
                ),
                Route::OnboardingPhone
            );
            assert_eq!(
                post_auth_route(OnboardingState::PendingGuardianInfo, from_signup, None),
                Route::OnboardingGuardian
            );
        }
    }

    #[test]
    fn test_unknown_state_falls_back_to_dashboard() {
        assert_eq!(
            post_auth_route(OnboardingState::Unknown, false, Some(UserRole::Student)),
            Route::Dashboard
        );
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::login_timeout().path(), "/login?reason=timeout");
        assert_eq!(Route::Login { reason: None }.path(), "/login");
        assert_eq!(Route::OnboardingRole.path(), "/onboarding/role");
        assert_eq!(
            Route::GuardianApprove {
                approval_id: "ap1".into()
            }
            .path(),
            "/guardian/approve/ap1"
        );
    }
}
