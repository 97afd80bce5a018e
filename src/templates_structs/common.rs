use askama::Template;

use crate::models::event::Event;
use crate::models::feedback::StatusCounts;
use crate::models::news::NewsItem;
use crate::models::query_filter::SelectOption;
use crate::models::user::User;
use super::PageContext;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub login: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub greeting: String,
    pub recent_news: Vec<NewsItem>,
    pub upcoming_events: Vec<Event>,
    pub my_feedback_count: usize,
    /// Present only for users who can see the feedback dashboard.
    pub feedback_counts: Option<StatusCounts>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub user: User,
    pub errors: Vec<String>,
    pub password_errors: Vec<String>,
    pub requires_current_password: bool,
    pub theme_options: Vec<SelectOption>,
}
