use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::{RequestContext, set_flash};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::{CsrfOnly, redirect};
use crate::models::notification;
use crate::templates_structs::{NotificationListTemplate, PageContext};

const LIST_LIMIT: i64 = 100;

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
) -> Result<HttpResponse, AppError> {
    let items = notification::find_for_user(&pool, rc.user_id, LIST_LIMIT).await?;
    let ctx = PageContext::for_user(&session, &pool, &rc, "/notifications").await;
    render(NotificationListTemplate { ctx, items })
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    if !notification::mark_read(&pool, path.into_inner(), rc.user_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(redirect("/notifications"))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let n = notification::mark_all_read(&pool, rc.user_id).await?;
    log::debug!("User {} marked {n} notifications read", rc.user_id);
    set_flash(&session, "All notifications marked as read");
    Ok(redirect("/notifications"))
}
