use crate::db::{models::*, DbPool};
use crate::error::Result;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqliteConnection;

/// Insert a recipe or overwrite every mutable field of the row with the same
/// (`source_id`, `source_recipe_id`). The row id is preserved on update.
pub async fn upsert_recipe(conn: &mut SqliteConnection, recipe: &NewRecipe) -> Result<Recipe> {
    let now = Utc::now();

    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (
            source_id, source_recipe_id, title, summary, instructions_raw,
            instructions_plain, servings, total_time_minutes, image_url,
            cuisines, diets, intolerances, lang, is_soup, last_fetched_at,
            signature, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (source_id, source_recipe_id) DO UPDATE SET
            title = excluded.title,
            summary = excluded.summary,
            instructions_raw = excluded.instructions_raw,
            instructions_plain = excluded.instructions_plain,
            servings = excluded.servings,
            total_time_minutes = excluded.total_time_minutes,
            image_url = excluded.image_url,
            cuisines = excluded.cuisines,
            diets = excluded.diets,
            intolerances = excluded.intolerances,
            lang = excluded.lang,
            is_soup = excluded.is_soup,
            last_fetched_at = excluded.last_fetched_at,
            signature = excluded.signature,
            updated_at = excluded.updated_at
        RETURNING *
        "#,
    )
    .bind(recipe.source_id)
    .bind(&recipe.source_recipe_id)
    .bind(&recipe.title)
    .bind(&recipe.summary)
    .bind(&recipe.instructions_raw)
    .bind(&recipe.instructions_plain)
    .bind(recipe.servings)
    .bind(recipe.total_time_minutes)
    .bind(&recipe.image_url)
    .bind(Json(&recipe.cuisines))
    .bind(Json(&recipe.diets))
    .bind(Json(&recipe.intolerances))
    .bind(&recipe.lang)
    .bind(recipe.is_soup)
    .bind(now)
    .bind(&recipe.signature)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(recipe)
}

/// Get recipe by ID, `None` when it does not exist
pub async fn find_recipe(pool: &DbPool, recipe_id: i64) -> Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

    Ok(recipe)
}

/// Get recipe by its provider-local identity
pub async fn find_by_source_recipe_id(
    pool: &DbPool,
    source_id: i64,
    source_recipe_id: &str,
) -> Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(
        "SELECT * FROM recipes WHERE source_id = ? AND source_recipe_id = ?",
    )
    .bind(source_id)
    .bind(source_recipe_id)
    .fetch_optional(pool)
    .await?;

    Ok(recipe)
}

/// Recipes sharing a content signature, possibly from different sources
pub async fn find_by_signature(pool: &DbPool, signature: &str) -> Result<Vec<Recipe>> {
    let recipes =
        sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE signature = ? ORDER BY id")
            .bind(signature)
            .fetch_all(pool)
            .await?;

    Ok(recipes)
}

/// Signatures carried by more than one recipe, with their recipe count
pub async fn list_duplicate_signatures(pool: &DbPool) -> Result<Vec<(String, i64)>> {
    let duplicates: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT signature, COUNT(*) AS count
        FROM recipes
        GROUP BY signature
        HAVING COUNT(*) > 1
        ORDER BY count DESC, signature
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(duplicates)
}

/// Title and plain instructions of every stored recipe
pub async fn list_recipe_texts(pool: &DbPool) -> Result<Vec<(String, Option<String>)>> {
    let texts: Vec<(String, Option<String>)> =
        sqlx::query_as("SELECT title, instructions_plain FROM recipes ORDER BY id")
            .fetch_all(pool)
            .await?;

    Ok(texts)
}

/// Count all recipes
pub async fn count_all_recipes(pool: &DbPool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}
