use std::collections::HashMap;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::{RequestContext, set_flash};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::{CsrfOnly, redirect};
use crate::models::event::{self, EventForm, EventInput};
use crate::models::notification::{self, Action, ContentType, NewNotification};
use crate::models::query_filter::{ContentFilter, date_options};
use crate::templates_structs::{EventDetailTemplate, EventFormTemplate, EventListTemplate, PageContext};

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    rc.require("read", "events")?;
    let filter = ContentFilter::from_query(&query);
    let items = event::find_filtered(&pool, &filter).await?;

    let ctx = PageContext::for_user(&session, &pool, &rc, "/events").await;
    render(EventListTemplate {
        ctx,
        items,
        search: filter.search_value(),
        date_options: date_options(filter.date_value()),
        can_create: rc.has_permission("create", "events"),
        now: Utc::now(),
    })
}

pub async fn detail(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    rc.require("read", "events")?;
    let item = event::find_by_id(&pool, path.into_inner()).await?.ok_or(AppError::NotFound)?;
    let ctx = PageContext::for_user(&session, &pool, &rc, "/events").await;
    render(EventDetailTemplate {
        ctx,
        item,
        can_edit: rc.has_permission("update", "events"),
        can_delete: rc.has_permission("delete", "events"),
    })
}

/// Raw form values, echoed back when validation fails.
struct FormValues {
    title: String,
    description: String,
    location: String,
    event_date: String,
    end_date: String,
    image_url: String,
}

impl From<&EventForm> for FormValues {
    fn from(f: &EventForm) -> Self {
        Self {
            title: f.title.clone(),
            description: f.description.clone(),
            location: f.location.clone(),
            event_date: f.event_date.clone(),
            end_date: f.end_date.clone(),
            image_url: f.image_url.clone(),
        }
    }
}

async fn render_form(
    pool: &PgPool,
    session: &Session,
    rc: &RequestContext,
    form_action: String,
    form_title: &str,
    values: FormValues,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::for_user(session, pool, rc, "/events").await;
    render(EventFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        title: values.title,
        description: values.description,
        location: values.location,
        event_date: values.event_date,
        end_date: values.end_date,
        image_url: values.image_url,
        errors,
    })
}

async fn announce(pool: &PgPool, input: &EventInput, id: i64, action: Action, author_id: i64) {
    let when = input.event_date.format("%d %b %Y %H:%M");
    let note = NewNotification {
        content_type: ContentType::Event,
        action,
        title: input.title.clone(),
        description: if input.location.is_empty() {
            when.to_string()
        } else {
            format!("{when} at {}", input.location)
        },
        created_by: Some(author_id),
        item_id: Some(id),
    };
    if let Err(e) = notification::notify_all_active(pool, &note, Some(author_id)).await {
        log::warn!("Failed to fan out event {id} notification: {e}");
    }
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
) -> Result<HttpResponse, AppError> {
    rc.require("create", "events")?;
    let values = FormValues {
        title: String::new(),
        description: String::new(),
        location: String::new(),
        event_date: String::new(),
        end_date: String::new(),
        image_url: String::new(),
    };
    render_form(&pool, &session, &rc, "/events".to_string(), "Create Event", values, vec![]).await
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    form: web::Form<EventForm>,
) -> Result<HttpResponse, AppError> {
    rc.require("create", "events")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render_form(&pool, &session, &rc, "/events".to_string(), "Create Event", (&*form).into(), errors).await;
        }
    };

    let id = event::create(&pool, &input, rc.user_id).await?;
    log::info!("User {} created event {id}", rc.user_id);
    announce(&pool, &input, id, Action::Created, rc.user_id).await;

    set_flash(&session, "Event created");
    Ok(redirect(&format!("/events/{id}")))
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    rc.require("update", "events")?;
    let id = path.into_inner();
    let item = event::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let values = FormValues {
        event_date: item.event_date_input(),
        end_date: item.end_date_input(),
        title: item.title,
        description: item.description,
        location: item.location,
        image_url: item.image_url,
    };
    render_form(&pool, &session, &rc, format!("/events/{id}"), "Edit Event", values, vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<EventForm>,
) -> Result<HttpResponse, AppError> {
    rc.require("update", "events")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render_form(&pool, &session, &rc, format!("/events/{id}"), "Edit Event", (&*form).into(), errors).await;
        }
    };

    if !event::update(&pool, id, &input).await? {
        return Err(AppError::NotFound);
    }
    log::info!("User {} updated event {id}", rc.user_id);
    announce(&pool, &input, id, Action::Updated, rc.user_id).await;

    set_flash(&session, "Event updated");
    Ok(redirect(&format!("/events/{id}")))
}

pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    rc.require("delete", "events")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();
    if !event::delete(&pool, id).await? {
        return Err(AppError::NotFound);
    }
    log::info!("User {} deleted event {id}", rc.user_id);
    set_flash(&session, "Event deleted");
    Ok(redirect("/events"))
}
