// Template context structures for Askama templates, organized by domain.

use actix_session::Session;
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::{self, Permissions, RequestContext, take_flash};
use crate::models::notification;

/// One sidebar link, already filtered by permission.
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

/// (label, href, required permission code). Empty code = any logged-in user.
const NAV: &[(&str, &str, &str)] = &[
    ("Dashboard", "/dashboard", ""),
    ("News", "/news", "read:news"),
    ("Events", "/events", "read:events"),
    ("Submit Feedback", "/feedback/submit", "create:feedback"),
    ("My Feedback", "/feedback", "create:feedback"),
    ("Feedback Dashboard", "/admin/feedback", "read:feedback"),
    ("Users", "/admin/users", "read:users"),
    ("Notifications", "/notifications", ""),
    ("Profile", "/profile", ""),
];

pub fn nav_items(permissions: &Permissions, current_path: &str) -> Vec<NavItem> {
    NAV.iter()
        .filter(|(_, _, code)| code.is_empty() || permissions.has(code))
        .map(|(label, href, _)| NavItem {
            label,
            href,
            active: *href == current_path,
        })
        .collect()
}

/// Common context shared by all pages.
/// Templates access these as `ctx.username`, `ctx.nav_items`, etc.
pub struct PageContext {
    pub logged_in: bool,
    pub user_id: i64,
    pub username: String,
    pub avatar_initial: String,
    pub role_label: String,
    pub permissions: Permissions,
    pub flash: Option<String>,
    pub nav_items: Vec<NavItem>,
    pub csrf_token: String,
    pub unread_count: i64,
    pub theme_mode: String,
    pub primary_color: String,
}

impl PageContext {
    pub async fn for_user(session: &Session, pool: &PgPool, rc: &RequestContext, current_path: &str) -> Self {
        let unread_count = notification::count_unread(pool, rc.user_id).await;
        Self {
            logged_in: true,
            user_id: rc.user_id,
            username: rc.username.clone(),
            avatar_initial: rc.username.chars().next().unwrap_or('?').to_uppercase().to_string(),
            role_label: rc.role.label().to_string(),
            permissions: rc.permissions.clone(),
            flash: take_flash(session),
            nav_items: nav_items(&rc.permissions, current_path),
            csrf_token: csrf::get_or_create_token(session),
            unread_count,
            theme_mode: rc.theme_mode.clone(),
            primary_color: rc.primary_color.clone(),
        }
    }

    /// Context for pages that visitors may also see.
    pub async fn build_public(session: &Session, pool: &PgPool, current_path: &str) -> Self {
        if let Some(rc) = RequestContext::optional(session) {
            return Self::for_user(session, pool, &rc, current_path).await;
        }
        let (theme_mode, primary_color) = session::preferences(session);
        Self {
            logged_in: false,
            user_id: 0,
            username: String::new(),
            avatar_initial: String::new(),
            role_label: String::new(),
            permissions: Permissions::default(),
            flash: take_flash(session),
            nav_items: vec![],
            csrf_token: csrf::get_or_create_token(session),
            unread_count: 0,
            theme_mode,
            primary_color,
        }
    }
}

mod common;
mod content;
mod feedback;
mod notification_list;
mod user;

pub use self::common::{DashboardTemplate, LoginTemplate, ProfileTemplate, RegisterTemplate};
pub use self::content::{
    EventDetailTemplate, EventFormTemplate, EventListTemplate, NewsDetailTemplate,
    NewsFormTemplate, NewsListTemplate,
};
pub use self::feedback::{
    FeedbackAdminRow, FeedbackAdminTemplate, FeedbackMineTemplate, FeedbackSubmitTemplate,
};
pub use self::notification_list::NotificationListTemplate;
pub use self::user::{UserFormTemplate, UserListTemplate};
