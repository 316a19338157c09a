use crate::db::{models::*, DbPool};
use crate::error::Result;
use crate::utils::text::normalize;
use chrono::Utc;
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Normalize ingredient name (trim, lowercase, collapse whitespace)
pub fn normalize_ingredient(name: &str) -> String {
    normalize(name)
}

/// Get or create an ingredient by normalized name
pub async fn get_or_create_ingredient(conn: &mut SqliteConnection, name: &str) -> Result<Ingredient> {
    let normalized = normalize_ingredient(name);

    sqlx::query("INSERT INTO ingredients (name, created_at) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(&normalized)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    let ingredient = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE name = ?")
        .bind(&normalized)
        .fetch_one(&mut *conn)
        .await?;

    Ok(ingredient)
}

/// Insert a join row, overwriting the quantities of an existing
/// (recipe, ingredient, unit, note) row
pub async fn upsert_recipe_ingredient(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    ingredient_id: i64,
    line: &NewRecipeIngredient,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, unit, note, quantity, quantity_in_grams)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (recipe_id, ingredient_id, unit, note) DO UPDATE SET
            quantity = excluded.quantity,
            quantity_in_grams = excluded.quantity_in_grams
        "#,
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .bind(line.unit.as_deref().unwrap_or(""))
    .bind(line.note.as_deref().unwrap_or(""))
    .bind(line.quantity)
    .bind(line.quantity_in_grams)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Upsert every ingredient line of a recipe and remove join rows the
/// current import no longer mentions. Lines with a blank name are skipped.
/// Returns the number of join rows written.
pub async fn upsert_recipe_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    lines: &[NewRecipeIngredient],
) -> Result<usize> {
    let mut kept: HashSet<(i64, String, String)> = HashSet::new();

    for line in lines {
        if normalize_ingredient(&line.name).is_empty() {
            continue;
        }

        let ingredient = get_or_create_ingredient(conn, &line.name).await?;
        upsert_recipe_ingredient(conn, recipe_id, ingredient.id, line).await?;

        kept.insert((
            ingredient.id,
            line.unit.clone().unwrap_or_default(),
            line.note.clone().unwrap_or_default(),
        ));
    }

    let existing: Vec<(i64, String, String)> = sqlx::query_as(
        "SELECT ingredient_id, unit, note FROM recipe_ingredients WHERE recipe_id = ?",
    )
    .bind(recipe_id)
    .fetch_all(&mut *conn)
    .await?;

    for (ingredient_id, unit, note) in existing {
        if kept.contains(&(ingredient_id, unit.clone(), note.clone())) {
            continue;
        }
        sqlx::query(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ? AND ingredient_id = ? AND unit = ? AND note = ?",
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .bind(&unit)
        .bind(&note)
        .execute(&mut *conn)
        .await?;
    }

    Ok(kept.len())
}

/// Get ingredients for a recipe
pub async fn get_recipe_ingredients(
    pool: &DbPool,
    recipe_id: i64,
) -> Result<Vec<IngredientWithQuantity>> {
    let rows: Vec<(i64, String, Option<f64>, String, Option<f64>, String)> = sqlx::query_as(
        r#"
        SELECT i.id, i.name, ri.quantity, ri.unit, ri.quantity_in_grams, ri.note
        FROM ingredients i
        JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
        WHERE ri.recipe_id = ?
        ORDER BY i.name, ri.unit, ri.note
        "#,
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    let empty_as_none = |s: String| if s.is_empty() { None } else { Some(s) };

    Ok(rows
        .into_iter()
        .map(
            |(ingredient_id, name, quantity, unit, quantity_in_grams, note)| IngredientWithQuantity {
                ingredient_id,
                name,
                quantity,
                unit: empty_as_none(unit),
                quantity_in_grams,
                note: empty_as_none(note),
            },
        )
        .collect())
}

/// Count total ingredients
pub async fn count_ingredients(pool: &DbPool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}
