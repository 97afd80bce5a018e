use askama::Template;

use crate::models::query_filter::SelectOption;
use crate::models::user::User;
use super::PageContext;

#[derive(Template)]
#[template(path = "users/list.html")]
pub struct UserListTemplate {
    pub ctx: PageContext,
    pub users: Vec<User>,
    pub role_filter: Vec<SelectOption>,
    pub status_filter: Vec<SelectOption>,
    pub search: String,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "users/form.html")]
pub struct UserFormTemplate {
    pub ctx: PageContext,
    pub user: User,
    pub role_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub errors: Vec<String>,
}
