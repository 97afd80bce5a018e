use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::query_filter::{ContentFilter, WhereBuilder};
use super::types::*;

const SELECT_NEWS: &str = "\
    SELECT n.id, n.title, n.content, n.image_url, n.author_id, \
           COALESCE(NULLIF(TRIM(CONCAT(u.first_name, ' ', u.last_name)), ''), u.username, '') AS author_name, \
           n.status, n.created_at, n.updated_at \
    FROM news n \
    LEFT JOIN users u ON u.id = n.author_id";

/// News matching the filter, newest first, limited to the drafts `access` allows.
pub async fn find_filtered(
    pool: &PgPool,
    filter: &ContentFilter,
    access: DraftAccess,
) -> Result<Vec<NewsItem>, AppError> {
    let mut builder = WhereBuilder::new();
    if let DraftAccess::AuthoredBy(uid) = access {
        builder.push_raw(format!("(n.status = 'published' OR n.author_id = {uid})"));
    }
    filter.apply(&mut builder, "n.created_at", &["n.title", "n.content"]);
    let sql = format!("{SELECT_NEWS}{} ORDER BY n.created_at DESC, n.id DESC", builder.where_clause());

    let mut query = sqlx::query_as::<_, NewsItem>(&sql);
    for p in builder.params() {
        query = query.bind(p);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn find_recent(pool: &PgPool, limit: i64) -> Result<Vec<NewsItem>, AppError> {
    let sql = format!("{SELECT_NEWS} WHERE n.status = 'published' ORDER BY n.created_at DESC LIMIT $1");
    Ok(sqlx::query_as::<_, NewsItem>(&sql).bind(limit).fetch_all(pool).await?)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<NewsItem>, AppError> {
    let sql = format!("{SELECT_NEWS} WHERE n.id = $1");
    Ok(sqlx::query_as::<_, NewsItem>(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn create(pool: &PgPool, input: &NewsInput, author_id: i64) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO news (title, content, image_url, author_id, status) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(input.title.trim())
    .bind(input.content.trim())
    .bind(input.image_url.trim())
    .bind(author_id)
    .bind(&input.status)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, input: &NewsInput) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE news SET title = $1, content = $2, image_url = $3, status = $4, updated_at = NOW() \
         WHERE id = $5",
    )
    .bind(input.title.trim())
    .bind(input.content.trim())
    .bind(input.image_url.trim())
    .bind(&input.status)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM news WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
