use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::start_session;
use crate::errors::AppError;
use crate::handlers::auth_handlers::redirect;
use crate::oauth::{self, OAuthClient, Provider};

const STATE_KEY: &str = "oauth_state";

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn parse_provider(raw: &str) -> Result<Provider, AppError> {
    raw.parse::<Provider>().map_err(|_| AppError::NotFound)
}

/// Consume the stored state and compare it with the returned one.
pub fn take_and_check_state(session: &Session, returned: &str) -> Result<(), AppError> {
    let stored = session.get::<String>(STATE_KEY).unwrap_or(None);
    session.remove(STATE_KEY);
    match stored {
        Some(expected) if !returned.is_empty() && csrf::constant_time_eq(&expected, returned) => Ok(()),
        Some(_) => Err(AppError::BadRequest("OAuth state mismatch".to_string())),
        None => Err(AppError::BadRequest("No OAuth login in progress".to_string())),
    }
}

pub async fn login(
    path: web::Path<String>,
    session: Session,
    client: web::Data<OAuthClient>,
) -> Result<HttpResponse, AppError> {
    let provider = parse_provider(&path)?;
    let state = csrf::generate_token();
    session
        .insert(STATE_KEY, &state)
        .map_err(|e| AppError::Session(e.to_string()))?;

    if client.uses_dev_mode(provider) {
        return Ok(redirect(&format!(
            "/auth/{}/callback?code=dev&state={state}",
            provider.as_str()
        )));
    }
    Ok(redirect(&client.authorize_url(provider, &state)?))
}

pub async fn callback(
    path: web::Path<String>,
    query: web::Query<CallbackQuery>,
    session: Session,
    pool: web::Data<PgPool>,
    client: web::Data<OAuthClient>,
) -> Result<HttpResponse, AppError> {
    let provider = parse_provider(&path)?;

    if let Err(e) = take_and_check_state(&session, &query.state) {
        log::warn!("{provider} callback rejected: {e}");
        return Err(e);
    }

    if let Some(err) = &query.error {
        let desc = query.error_description.as_deref().unwrap_or("");
        return Err(AppError::OAuth(format!("{provider} returned error '{err}': {desc}")));
    }

    let profile = client.complete(provider, &query.code).await?;
    let u = oauth::resolve_user(&pool, &profile).await?;
    if !u.is_active() {
        return Err(AppError::OAuth(format!("inactive user {} attempted {provider} login", u.id)));
    }

    start_session(&session, u.id, &u.username, u.role())?;
    log::info!("User {} logged in with {provider}", u.username);
    Ok(redirect("/dashboard"))
}
