use std::collections::HashMap;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::{RequestContext, set_flash};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::{CsrfOnly, redirect};
use crate::models::feedback::{
    self, ALL_STATUSES, FeedbackFilter, FeedbackRow, FeedbackStatus, PORTFOLIOS, StatusUpdate,
    StatusUpdateForm,
};
use crate::models::notification::{self, Action, ContentType, NewNotification};
use crate::models::query_filter::{SelectOption, date_options};
use crate::models::user::{self, User};
use crate::notify::{Mailer, SmsSender, feedback_response_email};
use crate::templates_structs::{FeedbackAdminRow, FeedbackAdminTemplate, PageContext};

/// Result of a dashboard status update attempt.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(FeedbackRow),
    /// Nothing was written; the message is shown on the dashboard.
    Denied(String),
    Invalid(String),
    NotFound,
}

fn parse_update(form: &StatusUpdateForm) -> Result<StatusUpdate, String> {
    let status = form
        .status
        .parse::<FeedbackStatus>()
        .map_err(|_| "Please choose a valid status".to_string())?;
    let assigned_to = match form.assigned_to.trim() {
        "" => None,
        raw => Some(raw.parse::<i64>().map_err(|_| "Invalid assignee".to_string())?),
    };
    if form.resolution.chars().count() > 5000 {
        return Err("Response must be at most 5000 characters".to_string());
    }
    Ok(StatusUpdate {
        status,
        assigned_to,
        resolution: form.resolution.trim().to_string(),
    })
}

/// Permission-checked update of status, assignee and response.
pub async fn apply_status_update(
    pool: &PgPool,
    rc: &RequestContext,
    id: i64,
    form: &StatusUpdateForm,
) -> Result<UpdateOutcome, AppError> {
    if !rc.has_permission("update", "feedback") {
        log::warn!("User {} tried to update feedback {id} without update:feedback", rc.user_id);
        return Ok(UpdateOutcome::Denied(
            "You do not have permission to update feedback.".to_string(),
        ));
    }
    let update = match parse_update(form) {
        Ok(u) => u,
        Err(msg) => return Ok(UpdateOutcome::Invalid(msg)),
    };
    if let Some(assignee) = update.assigned_to {
        if user::find_by_id(pool, assignee).await?.is_none() {
            return Ok(UpdateOutcome::Invalid("Invalid assignee".to_string()));
        }
    }
    if !feedback::update_status(pool, id, &update).await? {
        return Ok(UpdateOutcome::NotFound);
    }
    log::info!("User {} set feedback {id} to {}", rc.user_id, update.status);
    match feedback::find_by_id(pool, id).await? {
        Some(row) => Ok(UpdateOutcome::Updated(row)),
        None => Ok(UpdateOutcome::NotFound),
    }
}

fn status_options(current: &str) -> Vec<SelectOption> {
    SelectOption::list(ALL_STATUSES.iter().map(|s| (s.as_str(), s.label())), current)
}

fn assignee_options(assignees: &[User], current: Option<i64>) -> Vec<SelectOption> {
    let mut options = vec![SelectOption {
        value: String::new(),
        label: "Unassigned".to_string(),
        selected: current.is_none(),
    }];
    options.extend(assignees.iter().map(|u| SelectOption {
        value: u.id.to_string(),
        label: u.display_name(),
        selected: current == Some(u.id),
    }));
    options
}

fn with_blank(blank: &'static str, items: &[(&'static str, &'static str)], current: &str) -> Vec<SelectOption> {
    let mut options = SelectOption::list([("", blank)], current);
    options.extend(SelectOption::list(items.iter().copied(), current));
    options
}

async fn render_dashboard(
    pool: &PgPool,
    session: &Session,
    rc: &RequestContext,
    filter: &FeedbackFilter,
    error: Option<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::for_user(session, pool, rc, "/admin/feedback").await;
    let items = feedback::find_filtered(pool, filter).await?;
    let counts = feedback::status_counts(pool).await?;
    let assignees = user::find_assignees(pool).await?;

    let rows = items
        .into_iter()
        .map(|row| FeedbackAdminRow {
            status_options: status_options(&row.status),
            assignee_options: assignee_options(&assignees, row.assigned_to),
            row,
        })
        .collect();

    let statuses: Vec<(&'static str, &'static str)> =
        ALL_STATUSES.iter().map(|s| (s.as_str(), s.label())).collect();

    render(FeedbackAdminTemplate {
        ctx,
        rows,
        counts,
        status_filter: with_blank("All statuses", &statuses, filter.status.as_deref().unwrap_or("")),
        type_filter: with_blank("All portfolios", PORTFOLIOS, filter.category.as_deref().unwrap_or("")),
        date_filter: date_options(filter.date.map(|d| d.as_str()).unwrap_or("")),
        search: filter.search.clone().unwrap_or_default(),
        filter_active: !filter.is_empty(),
        can_update: rc.has_permission("update", "feedback"),
        error,
    })
}

pub async fn dashboard(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    rc.require("read", "feedback")?;
    let filter = FeedbackFilter::from_query(&query);
    render_dashboard(&pool, &session, &rc, &filter, None).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<StatusUpdateForm>,
    mailer: web::Data<Mailer>,
    sms: web::Data<SmsSender>,
) -> Result<HttpResponse, AppError> {
    rc.require("read", "feedback")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    if form.update_status.is_none() {
        return Err(AppError::BadRequest("Missing update_status".to_string()));
    }

    let id = path.into_inner();
    match apply_status_update(&pool, &rc, id, &form).await? {
        UpdateOutcome::Updated(row) => {
            send_status_notifications(&pool, &mailer, &sms, &row, rc.user_id).await;
            set_flash(&session, "Feedback updated");
            Ok(redirect("/admin/feedback"))
        }
        UpdateOutcome::Denied(msg) | UpdateOutcome::Invalid(msg) => {
            render_dashboard(&pool, &session, &rc, &FeedbackFilter::default(), Some(msg)).await
        }
        UpdateOutcome::NotFound => Err(AppError::NotFound),
    }
}

pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    rc.require("delete", "feedback")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();
    if !feedback::delete(&pool, id).await? {
        return Err(AppError::NotFound);
    }
    log::info!("User {} deleted feedback {id}", rc.user_id);
    set_flash(&session, "Feedback deleted");
    Ok(redirect("/admin/feedback"))
}

/// Name to greet the submitter with in outbound messages.
fn contact_name(row: &FeedbackRow) -> String {
    match row.user_first_name.as_deref().map(str::trim) {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => row.submitter_name.trim().to_string(),
    }
}

/// In-app notification, then email and SMS in the background. Errors are logged only.
async fn send_status_notifications(
    pool: &PgPool,
    mailer: &web::Data<Mailer>,
    sms: &web::Data<SmsSender>,
    row: &FeedbackRow,
    actor_id: i64,
) {
    let Ok(status) = row.status.parse::<FeedbackStatus>() else {
        return;
    };

    if let Some(submitter) = row.user_id {
        let note = NewNotification {
            content_type: ContentType::Feedback,
            action: Action::StatusChanged,
            title: format!("Your feedback to {} is now {}", row.subject_label(), status.label()),
            description: row.resolution.clone(),
            created_by: Some(actor_id),
            item_id: Some(row.id),
        };
        if let Err(e) = notification::notify_users(pool, &note, &[submitter]).await {
            log::warn!("Failed to notify submitter of feedback {}: {e}", row.id);
        }
    }

    let email = row.display_email();
    if status.should_notify(&row.resolution) && !email.is_empty() {
        let name = contact_name(row);
        match feedback_response_email(&name, row.subject_label(), status.label(), &row.resolution) {
            Ok((subject, body)) => {
                let mailer = mailer.clone();
                let feedback_id = row.id;
                actix_web::rt::spawn(async move {
                    let to_name = if name.is_empty() { None } else { Some(name.as_str()) };
                    match mailer.send(&email, to_name, &subject, &body).await {
                        Ok(()) => log::info!("Sent response email for feedback {feedback_id}"),
                        Err(e) => log::error!("Response email for feedback {feedback_id} failed: {e}"),
                    }
                });
            }
            Err(e) => log::error!("Rendering response email for feedback {} failed: {e}", row.id),
        }
    }

    let phone = row.user_phone.clone().unwrap_or_default();
    if !phone.trim().is_empty() && sms.is_enabled() {
        let message = format!(
            "SRC: your feedback to {} is now {}.",
            row.subject_label(),
            status.label()
        );
        let sms = sms.clone();
        let feedback_id = row.id;
        actix_web::rt::spawn(async move {
            if let Err(e) = sms.send(&phone, &message).await {
                log::warn!("SMS for feedback {feedback_id} failed: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(status: &str, assigned_to: &str, resolution: &str) -> StatusUpdateForm {
        StatusUpdateForm {
            status: status.into(),
            assigned_to: assigned_to.into(),
            resolution: resolution.into(),
            update_status: Some("1".into()),
            csrf_token: "t".into(),
        }
    }

    #[test]
    fn parse_update_accepts_blank_assignee() {
        let u = parse_update(&form("in_progress", "", " looking into it ")).unwrap();
        assert_eq!(u.status, FeedbackStatus::InProgress);
        assert_eq!(u.assigned_to, None);
        assert_eq!(u.resolution, "looking into it");
    }

    #[test]
    fn parse_update_rejects_bad_values() {
        assert!(parse_update(&form("closed", "", "")).is_err());
        assert!(parse_update(&form("resolved", "abc", "")).is_err());
        assert_eq!(parse_update(&form("resolved", "12", "")).unwrap().assigned_to, Some(12));
    }

    #[test]
    fn status_options_select_current_row_status() {
        let opts = status_options("resolved");
        let selected: Vec<_> = opts.iter().filter(|o| o.selected).map(|o| o.value.as_str()).collect();
        assert_eq!(selected, vec!["resolved"]);
    }
}
