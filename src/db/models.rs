use crate::indexer::{Chunk, ChunkType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub source_id: i64,
    pub source_recipe_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub instructions_raw: Option<String>,
    pub instructions_plain: Option<String>,
    pub servings: Option<i64>,
    pub total_time_minutes: Option<i64>,
    pub image_url: Option<String>,
    pub cuisines: Json<Vec<String>>,
    pub diets: Json<Vec<String>>,
    pub intolerances: Json<Vec<String>>,
    pub lang: String,
    pub is_soup: bool,
    pub last_fetched_at: DateTime<Utc>,
    pub signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical recipe shape written by the importer.
/// Upserted by (`source_id`, `source_recipe_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub source_id: i64,
    pub source_recipe_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub instructions_raw: Option<String>,
    pub instructions_plain: Option<String>,
    pub servings: Option<i64>,
    pub total_time_minutes: Option<i64>,
    pub image_url: Option<String>,
    pub cuisines: Vec<String>,
    pub diets: Vec<String>,
    pub intolerances: Vec<String>,
    pub lang: String,
    pub is_soup: bool,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One ingredient line of a recipe, keyed by (ingredient name, unit, note)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipeIngredient {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub quantity_in_grams: Option<f64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientWithQuantity {
    pub ingredient_id: i64,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub quantity_in_grams: Option<f64>,
    pub note: Option<String>,
}

/// Nutrient amounts per serving; the source may omit any of them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NutritionFacts {
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
}

impl NutritionFacts {
    pub fn is_empty(&self) -> bool {
        *self == NutritionFacts::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Nutrition {
    pub recipe_id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub facts: NutritionFacts,
}

/// Costs are integer minor currency units (cents)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriceBreakdown {
    pub total_cost: i64,
    pub cost_per_serving: i64,
    pub items: Vec<NewPriceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriceItem {
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceBreakdown {
    pub recipe_id: i64,
    pub total_cost: i64,
    pub cost_per_serving: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceBreakdownItem {
    pub recipe_id: i64,
    pub name: String,
    pub unit: String,
    pub amount: Option<f64>,
    pub cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreakdownWithItems {
    #[serde(flatten)]
    pub breakdown: PriceBreakdown,
    pub items: Vec<PriceBreakdownItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeChunk {
    pub id: i64,
    pub recipe_id: i64,
    pub chunk_type: ChunkType,
    pub position: i64,
    pub content: String,
    pub token_count: i64,
    #[serde(skip)]
    pub embedding: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

/// A chunk ready to be stored, with its embedding when one was computed
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub chunk: Chunk,
    pub embedding: Option<Vec<f32>>,
}

/// Chunk joined with its recipe title, as read by the search service
#[derive(Debug, Clone, FromRow)]
pub struct SearchableChunk {
    pub id: i64,
    pub recipe_id: i64,
    pub title: String,
    pub content: String,
    pub embedding: Option<Vec<u8>>,
}
