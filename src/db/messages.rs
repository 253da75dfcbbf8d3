use chrono::NaiveDateTime;
use sqlx::PgPool;

/// Insert one message document, returning its row id.
pub async fn create(
    pool: &PgPool,
    document: &serde_json::Value,
    received_at: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO messages (document, received_at) VALUES ($1, $2) RETURNING id",
    )
    .bind(document)
    .bind(received_at)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
