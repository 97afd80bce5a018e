use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::session::{RequestContext, set_flash};
use crate::auth::{csrf, validate};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::redirect;
use crate::models::feedback::{self, FeedbackForm, NewFeedback, PORTFOLIOS, is_portfolio, portfolio_label};
use crate::models::notification::{self, Action, ContentType, NewNotification};
use crate::models::query_filter::SelectOption;
use crate::templates_structs::{FeedbackMineTemplate, FeedbackSubmitTemplate, PageContext};

fn portfolio_options(current: &str) -> Vec<SelectOption> {
    let mut options = SelectOption::list([("", "Select a portfolio")], current);
    options.extend(SelectOption::list(PORTFOLIOS.iter().copied(), current));
    options
}

/// Direct (visitor) submissions must identify themselves.
pub fn validate_submission(form: &FeedbackForm, direct: bool) -> Vec<String> {
    let mut errors = vec![];
    if !is_portfolio(form.subject.trim()) {
        errors.push("Please choose who the feedback is for".to_string());
    }
    errors.extend(validate::validate_length(&form.message, "Message", 10, 5000));
    if direct {
        errors.extend(validate::validate_required(&form.submitter_name, "Name", 100));
        errors.extend(validate::validate_email(&form.submitter_email));
    }
    errors
}

pub async fn submit_page(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build_public(&session, &pool, "/feedback/submit").await;
    render(FeedbackSubmitTemplate {
        ctx,
        portfolio_options: portfolio_options(""),
        message: String::new(),
        submitter_name: String::new(),
        submitter_email: String::new(),
        errors: vec![],
        submitted: false,
    })
}

pub async fn submit(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<FeedbackForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let rc = RequestContext::optional(&session);
    if let Some(rc) = &rc {
        rc.require("create", "feedback")?;
    }

    let errors = validate_submission(&form, rc.is_none());
    if !errors.is_empty() {
        let ctx = PageContext::build_public(&session, &pool, "/feedback/submit").await;
        return render(FeedbackSubmitTemplate {
            ctx,
            portfolio_options: portfolio_options(form.subject.trim()),
            message: form.message.clone(),
            submitter_name: form.submitter_name.clone(),
            submitter_email: form.submitter_email.clone(),
            errors,
            submitted: false,
        });
    }

    let new = match &rc {
        Some(rc) => NewFeedback {
            subject: form.subject.trim().to_string(),
            message: form.message.trim().to_string(),
            user_id: Some(rc.user_id),
            submitter_name: String::new(),
            submitter_email: String::new(),
        },
        None => NewFeedback {
            subject: form.subject.trim().to_string(),
            message: form.message.trim().to_string(),
            user_id: None,
            submitter_name: form.submitter_name.trim().to_string(),
            submitter_email: form.submitter_email.trim().to_string(),
        },
    };
    let id = feedback::create(&pool, &new).await?;
    log::info!("Feedback {id} submitted to {}", new.subject);

    let note = NewNotification {
        content_type: ContentType::Feedback,
        action: Action::Created,
        title: format!("New feedback for {}", portfolio_label(&new.subject)),
        description: new.message.chars().take(140).collect(),
        created_by: new.user_id,
        item_id: Some(id),
    };
    if let Err(e) = notification::notify_permission_holders(&pool, &note, "read:feedback").await {
        log::warn!("Failed to notify reviewers about feedback {id}: {e}");
    }

    set_flash(&session, "Thank you! Your feedback has been submitted.");
    if rc.is_some() {
        Ok(redirect("/feedback"))
    } else {
        let ctx = PageContext::build_public(&session, &pool, "/feedback/submit").await;
        render(FeedbackSubmitTemplate {
            ctx,
            portfolio_options: portfolio_options(""),
            message: String::new(),
            submitter_name: String::new(),
            submitter_email: String::new(),
            errors: vec![],
            submitted: true,
        })
    }
}

/// The current user's own submissions.
pub async fn mine(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::for_user(&session, &pool, &rc, "/feedback").await;
    let items = feedback::find_by_user(&pool, rc.user_id).await?;
    render(FeedbackMineTemplate { ctx, items })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(subject: &str, message: &str, name: &str, email: &str) -> FeedbackForm {
        FeedbackForm {
            subject: subject.into(),
            message: message.into(),
            submitter_name: name.into(),
            submitter_email: email.into(),
            csrf_token: "t".into(),
        }
    }

    #[test]
    fn registered_users_need_no_identity() {
        let f = form("welfare", "The hostel water supply is unreliable", "", "");
        assert!(validate_submission(&f, false).is_empty());
        assert_eq!(validate_submission(&f, true).len(), 2);
    }

    #[test]
    fn subject_must_be_a_portfolio_and_message_long_enough() {
        let f = form("dean", "short", "Jane", "jane@x.com");
        assert_eq!(validate_submission(&f, true).len(), 2);
    }

    #[test]
    fn portfolio_options_preselect_current() {
        let opts = portfolio_options("sports");
        assert_eq!(opts.len(), PORTFOLIOS.len() + 1);
        assert_eq!(opts.iter().filter(|o| o.selected).count(), 1);
        assert!(opts.iter().any(|o| o.selected && o.value == "sports"));
    }
}
