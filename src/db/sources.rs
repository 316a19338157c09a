use crate::db::{models::Source, DbPool};
use crate::error::Result;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Get the source with this name, creating it on first use
pub async fn ensure_source(conn: &mut SqliteConnection, name: &str) -> Result<Source> {
    sqlx::query("INSERT INTO sources (name, created_at) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    let source = sqlx::query_as::<_, Source>("SELECT * FROM sources WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(source)
}

/// Get source by name
pub async fn get_source_by_name(pool: &DbPool, name: &str) -> Result<Option<Source>> {
    let source = sqlx::query_as::<_, Source>("SELECT * FROM sources WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(source)
}
