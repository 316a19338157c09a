use crate::db::{models::*, DbPool};
use crate::error::Result;
use crate::retrieval::embedding::vec_to_blob;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Delete every chunk of a recipe and insert the new set in order.
/// Returns the number of chunks written.
pub async fn replace_chunks(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    chunks: &[NewChunk],
) -> Result<usize> {
    sqlx::query("DELETE FROM recipe_chunks WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    let now = Utc::now();

    for (position, new_chunk) in chunks.iter().enumerate() {
        let embedding = new_chunk.embedding.as_deref().map(vec_to_blob);

        sqlx::query(
            r#"
            INSERT INTO recipe_chunks (recipe_id, chunk_type, position, content, token_count, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(recipe_id)
        .bind(new_chunk.chunk.chunk_type)
        .bind(position as i64)
        .bind(&new_chunk.chunk.content)
        .bind(new_chunk.chunk.token_count as i64)
        .bind(embedding)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(chunks.len())
}

/// Get chunks for a recipe in their stored order
pub async fn get_recipe_chunks(pool: &DbPool, recipe_id: i64) -> Result<Vec<RecipeChunk>> {
    let chunks = sqlx::query_as::<_, RecipeChunk>(
        "SELECT * FROM recipe_chunks WHERE recipe_id = ? ORDER BY position",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(chunks)
}

/// Chunks with content but no embedding yet
pub async fn list_chunks_missing_embeddings(pool: &DbPool, limit: i64) -> Result<Vec<RecipeChunk>> {
    let chunks = sqlx::query_as::<_, RecipeChunk>(
        r#"
        SELECT * FROM recipe_chunks
        WHERE embedding IS NULL AND TRIM(content) <> ''
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(chunks)
}

pub async fn set_chunk_embedding(pool: &DbPool, chunk_id: i64, embedding: &[f32]) -> Result<()> {
    sqlx::query("UPDATE recipe_chunks SET embedding = ? WHERE id = ?")
        .bind(vec_to_blob(embedding))
        .bind(chunk_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Every stored chunk with its recipe title, for ranking
pub async fn list_searchable_chunks(pool: &DbPool) -> Result<Vec<SearchableChunk>> {
    let chunks = sqlx::query_as::<_, SearchableChunk>(
        r#"
        SELECT c.id, c.recipe_id, r.title, c.content, c.embedding
        FROM recipe_chunks c
        JOIN recipes r ON r.id = c.recipe_id
        ORDER BY c.recipe_id, c.position
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(chunks)
}

/// Count all chunks
pub async fn count_chunks(pool: &DbPool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipe_chunks")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}
