use crate::db::{models::*, DbPool};
use crate::error::Result;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Replace the price breakdown of a recipe and its line items
pub async fn upsert_price_breakdown(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    breakdown: &NewPriceBreakdown,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO price_breakdowns (recipe_id, total_cost, cost_per_serving, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (recipe_id) DO UPDATE SET
            total_cost = excluded.total_cost,
            cost_per_serving = excluded.cost_per_serving,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(recipe_id)
    .bind(breakdown.total_cost)
    .bind(breakdown.cost_per_serving)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM price_breakdown_items WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    for item in &breakdown.items {
        // The same (name, unit) can appear twice in one breakdown; costs add up
        sqlx::query(
            r#"
            INSERT INTO price_breakdown_items (recipe_id, name, unit, amount, cost)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (recipe_id, name, unit) DO UPDATE SET
                amount = COALESCE(price_breakdown_items.amount, 0) + COALESCE(excluded.amount, 0),
                cost = price_breakdown_items.cost + excluded.cost
            "#,
        )
        .bind(recipe_id)
        .bind(&item.name)
        .bind(item.unit.as_deref().unwrap_or(""))
        .bind(item.amount)
        .bind(item.cost)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Get the price breakdown of a recipe with items ordered by cost
pub async fn get_price_breakdown(
    pool: &DbPool,
    recipe_id: i64,
) -> Result<Option<PriceBreakdownWithItems>> {
    let breakdown =
        sqlx::query_as::<_, PriceBreakdown>("SELECT * FROM price_breakdowns WHERE recipe_id = ?")
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

    let Some(breakdown) = breakdown else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, PriceBreakdownItem>(
        "SELECT * FROM price_breakdown_items WHERE recipe_id = ? ORDER BY cost DESC, name",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(PriceBreakdownWithItems { breakdown, items }))
}
