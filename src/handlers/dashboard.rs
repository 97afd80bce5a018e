use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::{Local, Timelike};
use sqlx::PgPool;

use crate::auth::session::RequestContext;
use crate::errors::{AppError, render};
use crate::models::{event, feedback, news};
use crate::templates_structs::{DashboardTemplate, PageContext};

fn time_greeting(hour: u32, username: &str) -> String {
    let period = match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    };
    format!("{period}, {username}")
}

pub async fn index(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::for_user(&session, &pool, &rc, "/dashboard").await;

    let greeting = time_greeting(Local::now().hour(), &ctx.username);
    let recent_news = news::find_recent(&pool, 3).await?;
    let upcoming_events = event::find_upcoming(&pool, 3).await?;
    let my_feedback_count = feedback::find_by_user(&pool, rc.user_id).await?.len();
    let feedback_counts = if rc.has_permission("read", "feedback") {
        Some(feedback::status_counts(&pool).await?)
    } else {
        None
    };

    render(DashboardTemplate {
        ctx,
        greeting,
        recent_news,
        upcoming_events,
        my_feedback_count,
        feedback_counts,
    })
}
