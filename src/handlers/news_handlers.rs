use std::collections::HashMap;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::{RequestContext, set_flash};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::{CsrfOnly, redirect};
use crate::models::news::{self, DraftAccess, NEWS_STATUSES, NewsForm, NewsInput, NewsItem};
use crate::models::notification::{self, Action, ContentType, NewNotification};
use crate::models::query_filter::{ContentFilter, SelectOption, date_options};
use crate::templates_structs::{NewsDetailTemplate, NewsFormTemplate, NewsListTemplate, PageContext};

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    rc.require("read", "news")?;
    let filter = ContentFilter::from_query(&query);
    let can_edit = rc.has_permission("update", "news");
    let items = news::find_filtered(&pool, &filter, draft_access(&rc)).await?;

    let ctx = PageContext::for_user(&session, &pool, &rc, "/news").await;
    render(NewsListTemplate {
        ctx,
        items,
        search: filter.search_value(),
        date_options: date_options(filter.date_value()),
        can_create: rc.has_permission("create", "news"),
        can_edit,
    })
}

/// Editors see every draft; everyone else only their own.
fn draft_access(rc: &RequestContext) -> DraftAccess {
    if rc.has_permission("update", "news") {
        DraftAccess::All
    } else {
        DraftAccess::AuthoredBy(rc.user_id)
    }
}

async fn find_visible(pool: &PgPool, rc: &RequestContext, id: i64) -> Result<NewsItem, AppError> {
    match news::find_by_id(pool, id).await? {
        Some(item) if item.is_visible_to(draft_access(rc)) => Ok(item),
        _ => Err(AppError::NotFound),
    }
}

pub async fn detail(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    rc.require("read", "news")?;
    let item = find_visible(&pool, &rc, path.into_inner()).await?;
    let ctx = PageContext::for_user(&session, &pool, &rc, "/news").await;
    render(NewsDetailTemplate {
        ctx,
        item,
        can_edit: rc.has_permission("update", "news"),
        can_delete: rc.has_permission("delete", "news"),
    })
}

fn status_options(current: &str) -> Vec<SelectOption> {
    SelectOption::list(NEWS_STATUSES.iter().copied(), current)
}

async fn render_form(
    pool: &PgPool,
    session: &Session,
    rc: &RequestContext,
    form_action: String,
    form_title: &str,
    values: (&str, &str, &str, &str),
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let (title, content, image_url, status) = values;
    let ctx = PageContext::for_user(session, pool, rc, "/news").await;
    render(NewsFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        image_url: image_url.to_string(),
        status_options: status_options(status),
        errors,
    })
}

async fn announce(pool: &PgPool, input: &NewsInput, id: i64, action: Action, author_id: i64) {
    if input.status != "published" {
        return;
    }
    let note = NewNotification {
        content_type: ContentType::News,
        action,
        title: input.title.clone(),
        description: input.content.chars().take(140).collect(),
        created_by: Some(author_id),
        item_id: Some(id),
    };
    if let Err(e) = notification::notify_all_active(pool, &note, Some(author_id)).await {
        log::warn!("Failed to fan out news {id} notification: {e}");
    }
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
) -> Result<HttpResponse, AppError> {
    rc.require("create", "news")?;
    render_form(&pool, &session, &rc, "/news".to_string(), "Create News", ("", "", "", "published"), vec![]).await
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    form: web::Form<NewsForm>,
) -> Result<HttpResponse, AppError> {
    rc.require("create", "news")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let values = (form.title.as_str(), form.content.as_str(), form.image_url.as_str(), form.status.as_str());
            return render_form(&pool, &session, &rc, "/news".to_string(), "Create News", values, errors).await;
        }
    };

    let id = news::create(&pool, &input, rc.user_id).await?;
    log::info!("User {} created news {id}", rc.user_id);
    announce(&pool, &input, id, Action::Created, rc.user_id).await;

    set_flash(&session, "News item created");
    Ok(redirect(&format!("/news/{id}")))
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    rc.require("update", "news")?;
    let id = path.into_inner();
    let item = news::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let values = (item.title.as_str(), item.content.as_str(), item.image_url.as_str(), item.status.as_str());
    render_form(&pool, &session, &rc, format!("/news/{id}"), "Edit News", values, vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<NewsForm>,
) -> Result<HttpResponse, AppError> {
    rc.require("update", "news")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let values = (form.title.as_str(), form.content.as_str(), form.image_url.as_str(), form.status.as_str());
            return render_form(&pool, &session, &rc, format!("/news/{id}"), "Edit News", values, errors).await;
        }
    };

    if !news::update(&pool, id, &input).await? {
        return Err(AppError::NotFound);
    }
    log::info!("User {} updated news {id}", rc.user_id);
    announce(&pool, &input, id, Action::Updated, rc.user_id).await;

    set_flash(&session, "News item updated");
    Ok(redirect(&format!("/news/{id}")))
}

pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    rc.require("delete", "news")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();
    if !news::delete(&pool, id).await? {
        return Err(AppError::NotFound);
    }
    log::info!("User {} deleted news {id}", rc.user_id);
    set_flash(&session, "News item deleted");
    Ok(redirect("/news"))
}
