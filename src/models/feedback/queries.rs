use sqlx::PgPool;

use crate::errors::AppError;
use super::filter::FeedbackFilter;
use super::types::*;

/// Feedback joined with submitter and assignee. Filters append after this.
const SELECT_FEEDBACK: &str = "\
    SELECT f.id, f.subject, f.message, f.user_id, \
           u.first_name AS user_first_name, u.last_name AS user_last_name, \
           u.email AS user_email, u.phone AS user_phone, \
           f.submitter_name, f.submitter_email, f.status, f.assigned_to, \
           NULLIF(TRIM(CONCAT(a.first_name, ' ', a.last_name)), '') AS assigned_name, \
           f.resolution, f.created_at, f.updated_at \
    FROM feedback f \
    LEFT JOIN users u ON u.id = f.user_id \
    LEFT JOIN users a ON a.id = f.assigned_to";

pub async fn create(pool: &PgPool, new: &NewFeedback) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO feedback (subject, message, user_id, submitter_name, submitter_email) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&new.subject)
    .bind(&new.message)
    .bind(new.user_id)
    .bind(&new.submitter_name)
    .bind(&new.submitter_email)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// All rows matching the filter, newest first. No pagination.
pub async fn find_filtered(pool: &PgPool, filter: &FeedbackFilter) -> Result<Vec<FeedbackRow>, AppError> {
    let builder = filter.to_builder();
    let sql = format!("{SELECT_FEEDBACK}{} ORDER BY f.created_at DESC, f.id DESC", builder.where_clause());

    let mut query = sqlx::query_as::<_, FeedbackRow>(&sql);
    for p in builder.params() {
        query = query.bind(p);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<FeedbackRow>, AppError> {
    let sql = format!("{SELECT_FEEDBACK} WHERE f.id = $1");
    let row = sqlx::query_as::<_, FeedbackRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<FeedbackRow>, AppError> {
    let sql = format!("{SELECT_FEEDBACK} WHERE f.user_id = $1 ORDER BY f.created_at DESC, f.id DESC");
    let rows = sqlx::query_as::<_, FeedbackRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn status_counts(pool: &PgPool) -> Result<StatusCounts, AppError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM feedback GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    let mut counts = StatusCounts::default();
    for (status, n) in rows {
        counts.total += n;
        match status.parse::<FeedbackStatus>() {
            Ok(FeedbackStatus::Pending) => counts.pending = n,
            Ok(FeedbackStatus::InProgress) => counts.in_progress = n,
            Ok(FeedbackStatus::Resolved) => counts.resolved = n,
            Ok(FeedbackStatus::Rejected) => counts.rejected = n,
            Err(_) => {}
        }
    }
    Ok(counts)
}

/// Apply status, assignee and resolution. Returns false when the row is missing.
pub async fn update_status(pool: &PgPool, id: i64, update: &StatusUpdate) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE feedback SET status = $1, assigned_to = $2, resolution = $3, updated_at = NOW() \
         WHERE id = $4",
    )
    .bind(update.status.as_str())
    .bind(update.assigned_to)
    .bind(update.resolution.trim())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
