use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::session::{self, is_logged_in, set_flash, start_session};
use crate::auth::{csrf, password, rate_limit::LoginRateLimiter, roles::Role, validate};
use crate::errors::{AppError, render};
use crate::models::user::{self, NewUser, RegisterForm};
use crate::templates_structs::{LoginTemplate, PageContext, RegisterTemplate};

#[derive(Deserialize)]
pub struct LoginForm {
    /// Username or email address.
    pub login: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

async fn login_error(session: &Session, pool: &PgPool, login: &str, error: &str) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build_public(session, pool, "/login").await;
    render(LoginTemplate {
        ctx,
        error: Some(error.to_string()),
        login: login.to_string(),
    })
}

pub async fn login_page(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if is_logged_in(&session) {
        return Ok(redirect("/dashboard"));
    }
    let ctx = PageContext::build_public(&session, &pool, "/login").await;
    render(LoginTemplate { ctx, error: None, login: String::new() })
}

pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<LoginRateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check BEFORE any database access
    let ip = req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failed attempts");
        return login_error(&session, &pool, &form.login, "Too many failed login attempts. Please try again later.").await;
    }

    let found = user::find_by_login(&pool, &form.login).await?;
    let u = match found {
        Some(u) if password::verify_password(&form.password, &u.password_hash).unwrap_or(false) => u,
        _ => {
            limiter.record_failure(ip);
            return login_error(&session, &pool, &form.login, "Invalid username or password").await;
        }
    };

    if !u.is_active() {
        log::info!("Rejected login for inactive user {}", u.id);
        return login_error(&session, &pool, &form.login, "This account has been deactivated").await;
    }

    limiter.clear(ip);
    start_session(&session, u.id, &u.username, u.role())?;
    log::info!("User {} logged in", u.username);
    Ok(redirect("/dashboard"))
}

pub async fn register_page(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if is_logged_in(&session) {
        return Ok(redirect("/dashboard"));
    }
    let ctx = PageContext::build_public(&session, &pool, "/register").await;
    render(RegisterTemplate {
        ctx,
        errors: vec![],
        username: String::new(),
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    })
}

fn validate_registration(form: &RegisterForm) -> Vec<String> {
    let mut errors: Vec<String> = vec![];
    errors.extend(validate::validate_username(&form.username));
    errors.extend(validate::validate_email(&form.email));
    errors.extend(validate::validate_optional(&form.first_name, "First name", 100));
    errors.extend(validate::validate_optional(&form.last_name, "Last name", 100));
    errors.extend(validate::validate_password(&form.password));
    if form.password != form.confirm_password {
        errors.push("Passwords do not match".to_string());
    }
    errors
}

pub async fn register_submit(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let mut errors = validate_registration(&form);
    if errors.is_empty() {
        if user::username_exists(&pool, form.username.trim()).await? {
            errors.push("Username is already taken".to_string());
        }
        if user::email_exists(&pool, &form.email).await? {
            errors.push("An account with this email already exists".to_string());
        }
    }

    if !errors.is_empty() {
        let ctx = PageContext::build_public(&session, &pool, "/register").await;
        return render(RegisterTemplate {
            ctx,
            errors,
            username: form.username.clone(),
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
        });
    }

    let password_hash = password::hash_password(&form.password).map_err(AppError::Hash)?;
    let new = NewUser {
        username: form.username.trim().to_string(),
        email: Some(form.email.trim().to_lowercase()),
        password_hash,
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        role: Role::User,
        oauth_provider: None,
        oauth_id: None,
        profile_picture: String::new(),
    };
    let id = user::create(&pool, &new).await?;
    log::info!("Registered user {id} '{}'", new.username);

    start_session(&session, id, &new.username, Role::User)?;
    set_flash(&session, "Welcome! Your account has been created.");
    Ok(redirect("/dashboard"))
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    if let Some(id) = session::get_user_id(&session) {
        log::info!("User {id} logged out");
    }
    session.purge();
    Ok(redirect("/login"))
}
