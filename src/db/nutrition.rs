use crate::db::{models::*, DbPool};
use crate::error::Result;
use sqlx::SqliteConnection;

/// Write the single nutrition row of a recipe, replacing every nutrient
pub async fn upsert_nutrition(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    facts: &NutritionFacts,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO nutrition (recipe_id, kcal, protein_g, carbs_g, fat_g, fiber_g, sugar_g, sodium_mg)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (recipe_id) DO UPDATE SET
            kcal = excluded.kcal,
            protein_g = excluded.protein_g,
            carbs_g = excluded.carbs_g,
            fat_g = excluded.fat_g,
            fiber_g = excluded.fiber_g,
            sugar_g = excluded.sugar_g,
            sodium_mg = excluded.sodium_mg
        "#,
    )
    .bind(recipe_id)
    .bind(facts.kcal)
    .bind(facts.protein_g)
    .bind(facts.carbs_g)
    .bind(facts.fat_g)
    .bind(facts.fiber_g)
    .bind(facts.sugar_g)
    .bind(facts.sodium_mg)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn get_nutrition(pool: &DbPool, recipe_id: i64) -> Result<Option<Nutrition>> {
    let nutrition = sqlx::query_as::<_, Nutrition>("SELECT * FROM nutrition WHERE recipe_id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

    Ok(nutrition)
}
