use askama::Template;

use crate::models::event::Event;
use crate::models::news::NewsItem;
use crate::models::query_filter::SelectOption;
use super::PageContext;

#[derive(Template)]
#[template(path = "news/list.html")]
pub struct NewsListTemplate {
    pub ctx: PageContext,
    pub items: Vec<NewsItem>,
    pub search: String,
    pub date_options: Vec<SelectOption>,
    pub can_create: bool,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "news/detail.html")]
pub struct NewsDetailTemplate {
    pub ctx: PageContext,
    pub item: NewsItem,
    pub can_edit: bool,
    pub can_delete: bool,
}

#[derive(Template)]
#[template(path = "news/form.html")]
pub struct NewsFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub status_options: Vec<SelectOption>,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "events/list.html")]
pub struct EventListTemplate {
    pub ctx: PageContext,
    pub items: Vec<Event>,
    pub search: String,
    pub date_options: Vec<SelectOption>,
    pub can_create: bool,
    pub now: chrono::DateTime<chrono::Utc>,
}

#[derive(Template)]
#[template(path = "events/detail.html")]
pub struct EventDetailTemplate {
    pub ctx: PageContext,
    pub item: Event,
    pub can_edit: bool,
    pub can_delete: bool,
}

#[derive(Template)]
#[template(path = "events/form.html")]
pub struct EventFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: String,
    pub end_date: String,
    pub image_url: String,
    pub errors: Vec<String>,
}
