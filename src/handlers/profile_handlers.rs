use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::session::{RequestContext, set_flash};
use crate::auth::{csrf, password, validate};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::redirect;
use crate::models::query_filter::SelectOption;
use crate::models::user::{self, ChangePasswordForm, ProfileForm, User};
use crate::templates_structs::{PageContext, ProfileTemplate};

const THEMES: [(&str, &str); 3] = [("auto", "System"), ("light", "Light"), ("dark", "Dark")];

#[derive(Debug, Deserialize)]
pub struct PreferencesForm {
    pub theme_mode: String,
    pub primary_color: String,
    pub csrf_token: String,
}

pub fn validate_preferences(theme_mode: &str, primary_color: &str) -> Vec<String> {
    let mut errors = vec![];
    if !THEMES.iter().any(|(t, _)| *t == theme_mode) {
        errors.push("Theme must be light, dark or auto".to_string());
    }
    errors.extend(validate::validate_hex_color(primary_color));
    errors
}

fn validate_password_change(form: &ChangePasswordForm, current_hash: &str) -> Vec<String> {
    let mut errors = vec![];
    if !password::is_unusable(current_hash) {
        match password::verify_password(&form.current_password, current_hash) {
            Ok(true) => {}
            _ => errors.push("Current password is incorrect".to_string()),
        }
    }
    errors.extend(validate::validate_password(&form.new_password));
    if form.new_password != form.confirm_password {
        errors.push("New passwords do not match".to_string());
    }
    errors
}

async fn render_profile(
    pool: &PgPool,
    session: &Session,
    rc: &RequestContext,
    profile: User,
    errors: Vec<String>,
    password_errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::for_user(session, pool, rc, "/profile").await;
    let theme_options = SelectOption::list(THEMES, &ctx.theme_mode);
    render(ProfileTemplate {
        ctx,
        requires_current_password: !password::is_unusable(&profile.password_hash),
        user: profile,
        errors,
        password_errors,
        theme_options,
    })
}

async fn current_user(pool: &PgPool, rc: &RequestContext) -> Result<User, AppError> {
    user::find_by_id(pool, rc.user_id)
        .await?
        .ok_or_else(|| AppError::Session("User no longer exists".to_string()))
}

pub async fn page(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
) -> Result<HttpResponse, AppError> {
    let profile = current_user(&pool, &rc).await?;
    render_profile(&pool, &session, &rc, profile, vec![], vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let mut errors: Vec<String> = vec![];
    errors.extend(validate::validate_optional(&form.first_name, "First name", 100));
    errors.extend(validate::validate_optional(&form.last_name, "Last name", 100));
    errors.extend(validate::validate_phone(&form.phone));

    if !errors.is_empty() {
        let mut profile = current_user(&pool, &rc).await?;
        profile.first_name = form.first_name.clone();
        profile.last_name = form.last_name.clone();
        profile.phone = form.phone.clone();
        return render_profile(&pool, &session, &rc, profile, errors, vec![]).await;
    }

    user::update_profile(&pool, rc.user_id, &form.first_name, &form.last_name, &form.phone).await?;
    log::info!("User {} updated their profile", rc.user_id);
    set_flash(&session, "Profile updated");
    Ok(redirect("/profile"))
}

pub async fn change_password(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    form: web::Form<ChangePasswordForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let profile = current_user(&pool, &rc).await?;
    let errors = validate_password_change(&form, &profile.password_hash);
    if !errors.is_empty() {
        return render_profile(&pool, &session, &rc, profile, vec![], errors).await;
    }

    let hash = password::hash_password(&form.new_password).map_err(AppError::Hash)?;
    user::update_password(&pool, rc.user_id, &hash).await?;
    log::info!("User {} changed their password", rc.user_id);
    set_flash(&session, "Password changed");
    Ok(redirect("/profile"))
}

/// POST /preferences: theme and accent colour live in the session only.
pub async fn preferences(
    session: Session,
    _rc: RequestContext,
    form: web::Form<PreferencesForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let theme = form.theme_mode.trim();
    let color = form.primary_color.trim().to_lowercase();
    let errors = validate_preferences(theme, &color);
    if !errors.is_empty() {
        return Err(AppError::BadRequest(errors.join("; ")));
    }

    let insert_err = |e: actix_session::SessionInsertError| AppError::Session(e.to_string());
    session.insert("theme_mode", theme).map_err(insert_err)?;
    session.insert("primary_color", &color).map_err(insert_err)?;
    set_flash(&session, "Preferences saved");
    Ok(redirect("/profile"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(current: &str, new: &str, confirm: &str) -> ChangePasswordForm {
        ChangePasswordForm {
            current_password: current.into(),
            new_password: new.into(),
            confirm_password: confirm.into(),
            csrf_token: "t".into(),
        }
    }

    #[test]
    fn preferences_validation() {
        assert!(validate_preferences("dark", "#0f766e").is_empty());
        assert_eq!(validate_preferences("neon", "blue").len(), 2);
    }

    #[test]
    fn oauth_only_accounts_skip_current_password() {
        let hash = password::unusable_hash();
        assert!(validate_password_change(&change("", "newpassword1", "newpassword1"), &hash).is_empty());
    }

    #[test]
    fn local_accounts_need_current_password() {
        let hash = password::hash_password("oldpassword1").unwrap();
        assert_eq!(
            validate_password_change(&change("wrong", "newpassword1", "newpassword1"), &hash),
            vec!["Current password is incorrect".to_string()]
        );
        assert!(validate_password_change(&change("oldpassword1", "newpassword1", "newpassword1"), &hash).is_empty());
    }
}
