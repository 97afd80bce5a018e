use askama::Template;

use crate::models::notification::NotificationItem;
use super::PageContext;

#[derive(Template)]
#[template(path = "notifications/list.html")]
pub struct NotificationListTemplate {
    pub ctx: PageContext,
    pub items: Vec<NotificationItem>,
}
