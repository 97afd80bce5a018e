use sqlx::{PgPool, Postgres, Transaction};

use crate::errors::AppError;
use crate::models::user;
use super::types::*;

async fn create(tx: &mut Transaction<'_, Postgres>, new: &NewNotification) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO notifications (content_type, action, title, description, created_by, item_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(new.content_type.as_str())
    .bind(new.action.as_str())
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.created_by)
    .bind(new.item_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn add_recipients(
    tx: &mut Transaction<'_, Postgres>,
    notification_id: i64,
    user_ids: &[i64],
) -> Result<u64, AppError> {
    if user_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        "INSERT INTO notification_recipients (notification_id, user_id) \
         SELECT $1, UNNEST($2::BIGINT[]) \
         ON CONFLICT DO NOTHING",
    )
    .bind(notification_id)
    .bind(user_ids)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

/// Create a notification and fan it out in one transaction. Nothing is
/// stored when there are no recipients or when any insert fails.
pub async fn notify_users(pool: &PgPool, new: &NewNotification, user_ids: &[i64]) -> Result<Option<i64>, AppError> {
    if user_ids.is_empty() {
        return Ok(None);
    }
    let mut tx = pool.begin().await?;
    let id = create(&mut tx, new).await?;
    add_recipients(&mut tx, id, user_ids).await?;
    tx.commit().await?;
    Ok(Some(id))
}

/// Notify every active user except `except`.
pub async fn notify_all_active(pool: &PgPool, new: &NewNotification, except: Option<i64>) -> Result<Option<i64>, AppError> {
    let ids = user::active_ids(pool, except).await?;
    notify_users(pool, new, &ids).await
}

/// Notify every active user whose role grants `code`.
pub async fn notify_permission_holders(pool: &PgPool, new: &NewNotification, code: &str) -> Result<Option<i64>, AppError> {
    let ids = user::active_ids_with_permission(pool, code).await?;
    notify_users(pool, new, &ids).await
}

pub async fn find_for_user(pool: &PgPool, user_id: i64, limit: i64) -> Result<Vec<NotificationItem>, AppError> {
    let rows = sqlx::query_as::<_, NotificationItem>(
        "SELECT n.id, n.content_type, n.action, n.title, n.description, n.item_id, \
                r.is_read, n.created_at \
         FROM notifications n \
         JOIN notification_recipients r ON r.notification_id = n.id \
         WHERE r.user_id = $1 \
         ORDER BY n.created_at DESC, n.id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_unread(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM notification_recipients WHERE user_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| {
        log::warn!("Failed to count unread notifications for user {user_id}: {e}");
        0
    })
}

/// Mark one notification read for this user. False when it is not theirs.
pub async fn mark_read(pool: &PgPool, notification_id: i64, user_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE notification_recipients SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
         WHERE notification_id = $1 AND user_id = $2",
    )
    .bind(notification_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(pool: &PgPool, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notification_recipients SET is_read = TRUE, read_at = NOW() \
         WHERE user_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
