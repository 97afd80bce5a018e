use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::query_filter::{ContentFilter, WhereBuilder};
use super::types::*;

const SELECT_EVENT: &str = "\
    SELECT e.id, e.title, e.description, e.location, e.event_date, e.end_date, e.image_url, \
           e.created_by, \
           COALESCE(NULLIF(TRIM(CONCAT(u.first_name, ' ', u.last_name)), ''), u.username, '') AS creator_name, \
           e.created_at, e.updated_at \
    FROM events e \
    LEFT JOIN users u ON u.id = e.created_by";

/// Events matching the filter, newest first. The date bucket applies to `created_at`.
pub async fn find_filtered(pool: &PgPool, filter: &ContentFilter) -> Result<Vec<Event>, AppError> {
    let mut builder = WhereBuilder::new();
    filter.apply(&mut builder, "e.created_at", &["e.title", "e.description", "e.location"]);
    let sql = format!("{SELECT_EVENT}{} ORDER BY e.created_at DESC, e.id DESC", builder.where_clause());

    let mut query = sqlx::query_as::<_, Event>(&sql);
    for p in builder.params() {
        query = query.bind(p);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Events that have not finished yet, soonest first.
pub async fn find_upcoming(pool: &PgPool, limit: i64) -> Result<Vec<Event>, AppError> {
    let sql = format!(
        "{SELECT_EVENT} WHERE COALESCE(e.end_date, e.event_date) >= NOW() \
         ORDER BY e.event_date ASC LIMIT $1"
    );
    Ok(sqlx::query_as::<_, Event>(&sql).bind(limit).fetch_all(pool).await?)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Event>, AppError> {
    let sql = format!("{SELECT_EVENT} WHERE e.id = $1");
    Ok(sqlx::query_as::<_, Event>(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn create(pool: &PgPool, input: &EventInput, created_by: i64) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO events (title, description, location, event_date, end_date, image_url, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.location)
    .bind(input.event_date)
    .bind(input.end_date)
    .bind(&input.image_url)
    .bind(created_by)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, input: &EventInput) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE events SET title = $1, description = $2, location = $3, event_date = $4, \
                end_date = $5, image_url = $6, updated_at = NOW() \
         WHERE id = $7",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.location)
    .bind(input.event_date)
    .bind(input.end_date)
    .bind(&input.image_url)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
