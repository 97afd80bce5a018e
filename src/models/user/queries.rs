use sqlx::PgPool;

use crate::auth::roles::Role;
use crate::errors::AppError;
use crate::models::query_filter::WhereBuilder;
use super::filter::UserFilter;
use super::types::*;

const SELECT_USER: &str = "\
    SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name, \
           u.phone, u.role, u.status, u.oauth_provider, u.oauth_id, u.profile_picture, \
           u.created_at, u.updated_at \
    FROM users u";

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE u.id = $1");
    Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?)
}

/// Local login accepts either the username or the email address.
pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE u.username = $1 OR LOWER(u.email) = LOWER($1) ORDER BY u.id LIMIT 1");
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(login.trim())
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_oauth(pool: &PgPool, provider: &str, oauth_id: &str) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE u.oauth_provider = $1 AND u.oauth_id = $2");
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(provider)
        .bind(oauth_id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE LOWER(u.email) = LOWER($1) ORDER BY u.id LIMIT 1");
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(email.trim())
        .fetch_optional(pool)
        .await?)
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
        .bind(email.trim())
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Create a user with status `Active`. Returns the new id.
pub async fn create(pool: &PgPool, new: &NewUser) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, role, status, \
                            oauth_provider, oauth_id, profile_picture) \
         VALUES ($1, $2, $3, $4, $5, $6, 'Active', $7, $8, $9) RETURNING id",
    )
    .bind(&new.username)
    .bind(new.email.as_deref())
    .bind(&new.password_hash)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(new.role.as_str())
    .bind(new.oauth_provider.as_deref())
    .bind(new.oauth_id.as_deref())
    .bind(&new.profile_picture)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Set the OAuth linkage and fill only the fields present in `link`.
pub async fn link_oauth(pool: &PgPool, id: i64, link: &OAuthLink) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE users SET oauth_provider = $1, oauth_id = $2, \
                first_name = COALESCE($3, first_name), \
                last_name = COALESCE($4, last_name), \
                profile_picture = COALESCE($5, profile_picture), \
                updated_at = NOW() \
         WHERE id = $6",
    )
    .bind(&link.provider)
    .bind(&link.oauth_id)
    .bind(link.first_name.as_deref())
    .bind(link.last_name.as_deref())
    .bind(link.profile_picture.as_deref())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    first_name: &str,
    last_name: &str,
    phone: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE users SET first_name = $1, last_name = $2, phone = $3, updated_at = NOW() WHERE id = $4",
    )
    .bind(first_name.trim())
    .bind(last_name.trim())
    .bind(phone.trim())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_role_status(pool: &PgPool, id: i64, role: Role, status: &str) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE users SET role = $1, status = $2, updated_at = NOW() WHERE id = $3")
        .bind(role.as_str())
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_filtered(pool: &PgPool, filter: &UserFilter) -> Result<Vec<User>, AppError> {
    let mut builder = WhereBuilder::new();
    filter.apply(&mut builder);
    let sql = format!("{SELECT_USER}{} ORDER BY u.created_at DESC, u.id DESC", builder.where_clause());

    let mut query = sqlx::query_as::<_, User>(&sql);
    for p in builder.params() {
        query = query.bind(p);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Active users eligible as feedback assignees (roles holding `update:feedback`).
pub async fn find_assignees(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let roles: Vec<String> = Role::holding("update:feedback")
        .iter()
        .map(|r| r.as_str().to_string())
        .collect();
    let sql = format!("{SELECT_USER} WHERE u.status = 'Active' AND u.role = ANY($1) ORDER BY u.first_name, u.username");
    Ok(sqlx::query_as::<_, User>(&sql).bind(roles).fetch_all(pool).await?)
}

/// Ids of active users, optionally excluding one (usually the actor).
pub async fn active_ids(pool: &PgPool, except: Option<i64>) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM users WHERE status = 'Active' AND ($1::BIGINT IS NULL OR id <> $1) ORDER BY id",
    )
    .bind(except)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Ids of active users whose role grants `code`.
pub async fn active_ids_with_permission(pool: &PgPool, code: &str) -> Result<Vec<i64>, AppError> {
    let roles: Vec<String> = Role::holding(code).iter().map(|r| r.as_str().to_string()).collect();
    if roles.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM users WHERE status = 'Active' AND role = ANY($1) ORDER BY id",
    )
    .bind(roles)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn count(pool: &PgPool) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(pool).await?)
}

/// Create the initial super admin when the users table is empty.
pub async fn seed_super_admin(pool: &PgPool, password_hash: &str) -> Result<bool, AppError> {
    if count(pool).await? > 0 {
        log::info!("Users already present, skipping admin seed");
        return Ok(false);
    }
    let new = NewUser {
        username: "admin".to_string(),
        email: Some("admin@src.local".to_string()),
        password_hash: password_hash.to_string(),
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        role: Role::SuperAdmin,
        oauth_provider: None,
        oauth_id: None,
        profile_picture: String::new(),
    };
    create(pool, &new).await?;
    log::info!("Seeded default super admin 'admin'");
    Ok(true)
}
