//! Shared fixtures for the database-backed integration tests.
//!
//! Every test receives a fresh database from `#[sqlx::test]` with the
//! migrations in `./migrations` already applied.

#![allow(dead_code)]

use sqlx::PgPool;

use src_portal::auth::password;
use src_portal::auth::roles::Role;
use src_portal::auth::session::{Permissions, RequestContext};
use src_portal::models::feedback::{self, NewFeedback, StatusUpdateForm};
use src_portal::models::user::{self, NewUser};

pub const TEST_PASS: &str = "password123";

/// Insert an active local account and return its id.
pub async fn insert_user(pool: &PgPool, username: &str, role: Role) -> i64 {
    insert_named_user(pool, username, role, "", "").await
}

pub async fn insert_named_user(pool: &PgPool, username: &str, role: Role, first: &str, last: &str) -> i64 {
    let new = NewUser {
        username: username.to_string(),
        email: Some(format!("{username}@uni.edu")),
        password_hash: password::hash_password(TEST_PASS).expect("hash password"),
        first_name: first.to_string(),
        last_name: last.to_string(),
        role,
        oauth_provider: None,
        oauth_id: None,
        profile_picture: String::new(),
    };
    user::create(pool, &new).await.expect("create user")
}

pub async fn deactivate(pool: &PgPool, user_id: i64) {
    sqlx::query("UPDATE users SET status = 'Inactive' WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("deactivate user");
}

pub fn context(user_id: i64, username: &str, role: Role) -> RequestContext {
    RequestContext {
        user_id,
        username: username.to_string(),
        role,
        permissions: Permissions::for_role(role),
        theme_mode: "auto".to_string(),
        primary_color: "#1d4ed8".to_string(),
    }
}

pub async fn insert_feedback(pool: &PgPool, subject: &str, message: &str, user_id: Option<i64>) -> i64 {
    let new = NewFeedback {
        subject: subject.to_string(),
        message: message.to_string(),
        user_id,
        submitter_name: String::new(),
        submitter_email: String::new(),
    };
    feedback::create(pool, &new).await.expect("create feedback")
}

pub async fn insert_direct_feedback(pool: &PgPool, subject: &str, message: &str, name: &str, email: &str) -> i64 {
    let new = NewFeedback {
        subject: subject.to_string(),
        message: message.to_string(),
        user_id: None,
        submitter_name: name.to_string(),
        submitter_email: email.to_string(),
    };
    feedback::create(pool, &new).await.expect("create feedback")
}

/// Pin a feedback row's creation time to a fixed SQL timestamp expression.
pub async fn set_feedback_created(pool: &PgPool, id: i64, timestamp_sql: &str) {
    sqlx::query(&format!("UPDATE feedback SET created_at = {timestamp_sql} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await
        .expect("set feedback created_at");
}

pub fn status_form(status: &str, assigned_to: &str, resolution: &str) -> StatusUpdateForm {
    StatusUpdateForm {
        status: status.to_string(),
        assigned_to: assigned_to.to_string(),
        resolution: resolution.to_string(),
        update_status: Some("1".to_string()),
        csrf_token: "unused".to_string(),
    }
}
