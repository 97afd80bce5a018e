use askama::Template;

use crate::models::feedback::{FeedbackRow, StatusCounts};
use crate::models::query_filter::SelectOption;
use super::PageContext;

#[derive(Template)]
#[template(path = "feedback/submit.html")]
pub struct FeedbackSubmitTemplate {
    pub ctx: PageContext,
    pub portfolio_options: Vec<SelectOption>,
    pub message: String,
    pub submitter_name: String,
    pub submitter_email: String,
    pub errors: Vec<String>,
    pub submitted: bool,
}

#[derive(Template)]
#[template(path = "feedback/mine.html")]
pub struct FeedbackMineTemplate {
    pub ctx: PageContext,
    pub items: Vec<FeedbackRow>,
}

/// Dashboard row with its edit-form dropdowns preselected.
pub struct FeedbackAdminRow {
    pub row: FeedbackRow,
    pub status_options: Vec<SelectOption>,
    pub assignee_options: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "feedback/admin.html")]
pub struct FeedbackAdminTemplate {
    pub ctx: PageContext,
    pub rows: Vec<FeedbackAdminRow>,
    pub counts: StatusCounts,
    pub status_filter: Vec<SelectOption>,
    pub type_filter: Vec<SelectOption>,
    pub date_filter: Vec<SelectOption>,
    pub search: String,
    pub filter_active: bool,
    pub can_update: bool,
    /// Shown above the table when an update was refused or invalid.
    pub error: Option<String>,
}
