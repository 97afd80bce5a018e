use sqlx::PgPool;

use crate::auth::{password, roles::Role};
use crate::errors::AppError;
use crate::models::user::{self, NewUser, OAuthLink, User};
use super::profile::OAuthProfile;

fn fill(current: &str, incoming: &str) -> Option<String> {
    let incoming = incoming.trim();
    if current.trim().is_empty() && !incoming.is_empty() {
        Some(incoming.to_string())
    } else {
        None
    }
}

/// Linkage for an account found by email: provider ids always, profile fields only where empty.
pub fn plan_link(existing: &User, profile: &OAuthProfile) -> OAuthLink {
    OAuthLink {
        provider: profile.provider.as_str().to_string(),
        oauth_id: profile.id.clone(),
        first_name: fill(&existing.first_name, &profile.first_name),
        last_name: fill(&existing.last_name, &profile.last_name),
        profile_picture: fill(&existing.profile_picture, &profile.picture),
    }
}

/// Username stem: verified email local part, else names, else provider + id.
pub fn username_base(profile: &OAuthProfile) -> String {
    let raw = match profile.verified_email().and_then(|e| e.split('@').next()) {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => {
            let names = format!("{}.{}", profile.first_name, profile.last_name);
            if names.trim_matches('.').is_empty() {
                format!("{}_{}", profile.provider.as_str(), profile.id)
            } else {
                names
            }
        }
    };
    let mut base: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .take(40)
        .collect();
    base = base.trim_matches('.').to_string();
    while base.len() < 3 {
        base.push('_');
    }
    base
}

/// First free username of the form `base`, `base1`, `base2`, ...
pub async fn generate_unique_username(pool: &PgPool, base: &str) -> Result<String, AppError> {
    if !user::username_exists(pool, base).await? {
        return Ok(base.to_string());
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}{n}");
        if !user::username_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Find or create the local account for a provider identity. Only a
/// provider-verified email may link to an existing account; an unverified one
/// is not stored at all.
pub async fn resolve_user(pool: &PgPool, profile: &OAuthProfile) -> Result<User, AppError> {
    let provider = profile.provider.as_str();

    if let Some(u) = user::find_by_oauth(pool, provider, &profile.id).await? {
        log::debug!("OAuth login matched user {} by {provider} id", u.id);
        return Ok(u);
    }

    if profile.email.is_some() && !profile.email_verified {
        log::warn!("{provider} identity {} has an unverified email, not linking", profile.id);
    }

    if let Some(email) = profile.verified_email() {
        if let Some(existing) = user::find_by_email(pool, email).await? {
            let link = plan_link(&existing, profile);
            user::link_oauth(pool, existing.id, &link).await?;
            log::info!("Linked {provider} account to existing user {}", existing.id);
            return user::find_by_id(pool, existing.id).await?.ok_or(AppError::NotFound);
        }
    }

    let username = generate_unique_username(pool, &username_base(profile)).await?;
    let new = NewUser {
        username,
        email: profile.verified_email().map(String::from),
        password_hash: password::unusable_hash(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        role: Role::User,
        oauth_provider: Some(provider.to_string()),
        oauth_id: Some(profile.id.clone()),
        profile_picture: profile.picture.clone(),
    };
    let id = user::create(pool, &new).await?;
    log::info!("Created user {id} '{}' from {provider} login", new.username);
    user::find_by_id(pool, id).await?.ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::Provider;
    use chrono::Utc;

    fn existing(first: &str, last: &str, picture: &str) -> User {
        User {
            id: 7,
            username: "kmensah".into(),
            email: Some("kofi@uni.edu".into()),
            password_hash: "x".into(),
            first_name: first.into(),
            last_name: last.into(),
            phone: String::new(),
            role: "user".into(),
            status: "Active".into(),
            oauth_provider: None,
            oauth_id: None,
            profile_picture: picture.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile(email: Option<&str>) -> OAuthProfile {
        OAuthProfile {
            provider: Provider::Google,
            id: "1098".into(),
            email: email.map(String::from),
            email_verified: true,
            first_name: "Kwame".into(),
            last_name: "Mensah".into(),
            picture: "https://img/x.png".into(),
        }
    }

    #[test]
    fn link_fills_only_empty_fields() {
        let link = plan_link(&existing("Kofi", "", ""), &profile(Some("kofi@uni.edu")));
        assert_eq!(link.provider, "google");
        assert_eq!(link.oauth_id, "1098");
        assert_eq!(link.first_name, None);
        assert_eq!(link.last_name.as_deref(), Some("Mensah"));
        assert_eq!(link.profile_picture.as_deref(), Some("https://img/x.png"));
    }

    #[test]
    fn username_base_prefers_email_local_part() {
        assert_eq!(username_base(&profile(Some("Kofi.Mensah+src@uni.edu"))), "kofi.mensahsrc");
        assert_eq!(username_base(&profile(None)), "kwame.mensah");
        let unverified = OAuthProfile { email_verified: false, ..profile(Some("admin@uni.edu")) };
        assert_eq!(username_base(&unverified), "kwame.mensah");
        let mut anon = profile(None);
        anon.first_name.clear();
        anon.last_name.clear();
        assert_eq!(username_base(&anon), "google_1098");
    }
}
