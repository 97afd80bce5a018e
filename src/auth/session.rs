use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use chrono::Utc;
use std::future::{Ready, ready};

use crate::auth::roles::Role;
use crate::errors::AppError;

/// Wrapper around permission codes with a `has()` method for use in Askama templates.
#[derive(Debug, Clone, Default)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    pub fn has(&self, code: &str) -> bool {
        self.0.iter().any(|p| p == code)
    }

    pub fn for_role(role: Role) -> Self {
        Permissions(role.permission_codes().into_iter().map(String::from).collect())
    }
}

/// Identity and rendering preferences of the user behind the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub permissions: Permissions,
    pub theme_mode: String,
    pub primary_color: String,
}

pub const DEFAULT_THEME: &str = "auto";
pub const DEFAULT_COLOR: &str = "#1d4ed8";

impl RequestContext {
    pub fn from_session(session: &Session) -> Result<Self, AppError> {
        if !is_logged_in(session) {
            return Err(AppError::Session("Not logged in".to_string()));
        }
        let user_id = get_user_id(session)
            .ok_or_else(|| AppError::Session("No user in session".to_string()))?;
        let username = session
            .get::<String>("username")
            .unwrap_or(None)
            .ok_or_else(|| AppError::Session("No username in session".to_string()))?;
        let role = session
            .get::<String>("role")
            .unwrap_or(None)
            .and_then(|r| r.parse::<Role>().ok())
            .ok_or_else(|| AppError::Session("No role in session".to_string()))?;
        let (theme_mode, primary_color) = preferences(session);

        Ok(Self {
            user_id,
            username,
            role,
            permissions: Permissions::for_role(role),
            theme_mode,
            primary_color,
        })
    }

    /// Like `from_session`, but for public pages that also serve visitors.
    pub fn optional(session: &Session) -> Option<Self> {
        Self::from_session(session).ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn has_permission(&self, action: &str, resource: &str) -> bool {
        self.role.has_permission(action, resource)
    }

    /// Check permission; returns Err(AppError) if denied.
    pub fn require(&self, action: &str, resource: &str) -> Result<(), AppError> {
        if self.has_permission(action, resource) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!("{action}:{resource}")))
        }
    }
}

impl FromRequest for RequestContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(RequestContext::from_session(&req.get_session()))
    }
}

/// Populate a fresh session after a successful local or OAuth login.
pub fn start_session(session: &Session, user_id: i64, username: &str, role: Role) -> Result<(), AppError> {
    session.renew();
    let insert_err = |e: actix_session::SessionInsertError| AppError::Session(e.to_string());
    session.insert("user_id", user_id).map_err(insert_err)?;
    session.insert("username", username).map_err(insert_err)?;
    session.insert("role", role.as_str()).map_err(insert_err)?;
    session.insert("is_logged_in", true).map_err(insert_err)?;
    session.insert("last_activity", Utc::now().timestamp()).map_err(insert_err)?;
    Ok(())
}

pub fn is_logged_in(session: &Session) -> bool {
    session.get::<bool>("is_logged_in").unwrap_or(None).unwrap_or(false)
        && get_user_id(session).is_some()
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

pub fn preferences(session: &Session) -> (String, String) {
    let theme = session
        .get::<String>("theme_mode")
        .unwrap_or(None)
        .unwrap_or_else(|| DEFAULT_THEME.to_string());
    let color = session
        .get::<String>("primary_color")
        .unwrap_or(None)
        .unwrap_or_else(|| DEFAULT_COLOR.to_string());
    (theme, color)
}

pub fn set_flash(session: &Session, message: &str) {
    let _ = session.insert("flash", message);
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}
