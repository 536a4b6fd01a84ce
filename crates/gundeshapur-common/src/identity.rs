//! Signed-in principal and role routing

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LibraryConfig;
use crate::error::{LibraryError, Result};

/// A signed-in principal as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "sub")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, alias = "picture")]
    pub image_url: String,
}

/// Role derived from the principal's email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Member,
}

impl Role {
    /// Administrator iff the email matches the configured address exactly
    pub fn for_profile(profile: &UserProfile, admin_email: &str) -> Self {
        if profile.email == admin_email {
            Role::Administrator
        } else {
            Role::Member
        }
    }
}

/// How the sign-in was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMode {
    /// Restored session, no prompt; routed purely by email
    Silent,
    /// Explicit sign-in to the standard view
    User,
    /// Explicit sign-in to the administrator view
    Admin,
}

/// Screen a signed-in principal lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Admin,
    User,
    /// Standard view without an active spreadsheet
    Setup,
}

/// Decide which view a principal is routed to.
pub fn route(mode: SignInMode, profile: &UserProfile, config: &LibraryConfig) -> Result<AppView> {
    if !config.is_configured() {
        return Err(LibraryError::Configuration(
            "Application is not configured. Please complete the setup wizard first.".to_string(),
        ));
    }
    let role = Role::for_profile(profile, config.require_admin_email()?);
    debug!(email = %profile.email, ?role, ?mode, "Routing signed-in user");

    let user_view = if config.has_spreadsheet() {
        AppView::User
    } else {
        AppView::Setup
    };

    match (mode, role) {
        (SignInMode::Silent, Role::Administrator) | (SignInMode::Admin, Role::Administrator) => {
            Ok(AppView::Admin)
        }
        (SignInMode::Admin, Role::Member) => Err(LibraryError::AccessDenied(
            "This Google account is not authorized for admin access.".to_string(),
        )),
        (SignInMode::Silent, Role::Member) | (SignInMode::User, _) => Ok(user_view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(email: &str) -> UserProfile {
        UserProfile {
            id: "1234".to_string(),
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            image_url: String::new(),
        }
    }

    fn config() -> LibraryConfig {
        LibraryConfig::new()
            .api_key("key")
            .client_id("client")
            .admin_email("admin@example.com")
            .spreadsheet_id("1AbC")
    }

    #[test]
    fn test_admin_email_routes_to_admin_view() {
        let view = route(SignInMode::Silent, &profile("admin@example.com"), &config()).unwrap();
        assert_eq!(view, AppView::Admin);
    }

    #[test]
    fn test_other_email_routes_to_user_view() {
        let view = route(SignInMode::Silent, &profile("reader@example.com"), &config()).unwrap();
        assert_eq!(view, AppView::User);
    }

    #[test]
    fn test_email_match_is_exact() {
        let role = Role::for_profile(&profile("Admin@Example.com"), "admin@example.com");
        assert_eq!(role, Role::Member);
    }

    #[test]
    fn test_admin_mode_rejects_member() {
        let err = route(SignInMode::Admin, &profile("reader@example.com"), &config()).unwrap_err();
        assert!(matches!(err, LibraryError::AccessDenied(_)));
    }

    #[test]
    fn test_user_mode_keeps_admin_in_user_view() {
        let view = route(SignInMode::User, &profile("admin@example.com"), &config()).unwrap();
        assert_eq!(view, AppView::User);
    }

    #[test]
    fn test_member_without_spreadsheet_goes_to_setup() {
        let mut config = config();
        config.spreadsheet_id = None;
        let view = route(SignInMode::User, &profile("reader@example.com"), &config).unwrap();
        assert_eq!(view, AppView::Setup);
    }

    #[test]
    fn test_unconfigured_is_rejected() {
        let err = route(SignInMode::User, &profile("reader@example.com"), &LibraryConfig::new())
            .unwrap_err();
        assert!(matches!(err, LibraryError::Configuration(_)));
    }

    #[test]
    fn test_profile_from_userinfo_payload() {
        let json = r#"{"sub":"1099","name":"Ada","email":"ada@example.com","picture":"https://img/ada.png","email_verified":true}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, "1099");
        assert_eq!(profile.image_url, "https://img/ada.png");
    }
}
