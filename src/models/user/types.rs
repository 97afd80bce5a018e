use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::roles::Role;

pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_INACTIVE: &str = "Inactive";

/// Internal user struct, includes the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: String,
    pub status: String,
    pub oauth_provider: Option<String>,
    pub oauth_id: Option<String>,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Unknown role strings degrade to the least privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Full name when known, username otherwise.
    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() { self.username.clone() } else { name }
    }

    pub fn email_str(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }

    pub fn role_label(&self) -> &'static str {
        self.role().label()
    }
}

/// New user data for creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub oauth_provider: Option<String>,
    pub oauth_id: Option<String>,
    pub profile_picture: String,
}

/// Empty-field backfill applied when an OAuth login links to an existing account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthLink {
    pub provider: String,
    pub oauth_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
    pub csrf_token: String,
}

/// Admin edit: role and status only.
#[derive(Debug, Deserialize)]
pub struct UserAdminForm {
    pub role: String,
    pub status: String,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "ama".into(),
            email: Some("ama@uni.edu".into()),
            password_hash: String::new(),
            first_name: "Ama".into(),
            last_name: String::new(),
            phone: String::new(),
            role: "finance".into(),
            status: STATUS_ACTIVE.into(),
            oauth_provider: None,
            oauth_id: None,
            profile_picture: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        assert_eq!(user().display_name(), "Ama");
        let nameless = User { first_name: String::new(), ..user() };
        assert_eq!(nameless.display_name(), "ama");
    }

    #[test]
    fn unknown_role_degrades_to_user() {
        assert_eq!(user().role(), Role::Finance);
        assert_eq!(User { role: "wizard".into(), ..user() }.role(), Role::User);
    }
}
