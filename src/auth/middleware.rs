use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};
use actix_session::Session;
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::session::{get_user_id, is_logged_in};
use crate::errors::AppError;
use crate::models::user;

/// Idle window after which a session is discarded, in minutes.
#[derive(Debug, Clone, Copy)]
pub struct IdleTimeout(pub i64);

/// Re-read the session's account from the database. Missing or inactive
/// accounts lose their session; otherwise the stored role and username are
/// replaced with the current values. Returns whether a user remains logged in.
pub async fn sync_account(session: &Session, pool: &PgPool) -> Result<bool, AppError> {
    let Some(user_id) = get_user_id(session).filter(|_| is_logged_in(session)) else {
        return Ok(false);
    };
    match user::find_by_id(pool, user_id).await? {
        Some(account) if account.is_active() => {
            let insert_err = |e: actix_session::SessionInsertError| AppError::Session(e.to_string());
            session.insert("role", account.role().as_str()).map_err(insert_err)?;
            session.insert("username", &account.username).map_err(insert_err)?;
            Ok(true)
        }
        _ => {
            log::info!("User {user_id} is inactive or gone, ending session");
            session.purge();
            Ok(false)
        }
    }
}

fn login_redirect() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", "/login"))
        .finish()
}

/// Middleware function that checks for an authenticated, non-idle session
/// backed by an active account. Redirects to /login otherwise and refreshes
/// `last_activity` on success.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();
    let idle_minutes = req
        .app_data::<web::Data<IdleTimeout>>()
        .map(|t| t.0)
        .unwrap_or(30);

    let now = Utc::now().timestamp();
    let last_activity = session.get::<i64>("last_activity").unwrap_or(None);

    if !is_logged_in(&session) || is_expired(last_activity, now, idle_minutes) {
        if last_activity.is_some() {
            log::info!("Session expired or invalid, redirecting to login");
        }
        session.purge();
        return Ok(req.into_response(login_redirect()).map_into_right_body());
    }

    let pool = req.app_data::<web::Data<PgPool>>().cloned();
    if let Some(pool) = pool {
        if !sync_account(&session, &pool).await? {
            return Ok(req.into_response(login_redirect()).map_into_right_body());
        }
    }

    let _ = session.insert("last_activity", now);
    next.call(req).await.map(|res| res.map_into_left_body())
}

/// For public pages: drop the session of an account that was deactivated,
/// so it is treated as a visitor. Never redirects.
pub async fn refresh_account(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let pool = req.app_data::<web::Data<PgPool>>().cloned();
    if let Some(pool) = pool {
        sync_account(&req.get_session(), &pool).await?;
    }
    next.call(req).await
}

fn is_expired(last_activity: Option<i64>, now: i64, idle_minutes: i64) -> bool {
    match last_activity {
        Some(ts) => idle_minutes > 0 && now - ts > idle_minutes * 60,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_activity_counts_as_expired() {
        assert!(is_expired(None, 1_000, 30));
    }

    #[test]
    fn activity_inside_window_is_fresh() {
        assert!(!is_expired(Some(1_000), 1_000 + 29 * 60, 30));
        assert!(is_expired(Some(1_000), 1_000 + 31 * 60, 30));
    }

    #[test]
    fn zero_minutes_disables_timeout() {
        assert!(!is_expired(Some(0), 10_000_000, 0));
    }
}
