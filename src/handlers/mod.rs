pub mod auth_handlers;
pub mod dashboard;
pub mod event_handlers;
pub mod feedback_handlers;
pub mod news_handlers;
pub mod notification_handlers;
pub mod oauth_handlers;
pub mod profile_handlers;
pub mod user_handlers;
