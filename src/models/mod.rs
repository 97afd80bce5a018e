pub mod event;
pub mod feedback;
pub mod news;
pub mod notification;
pub mod query_filter;
pub mod user;
