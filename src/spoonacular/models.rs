//! Typed payloads of the Spoonacular endpoints the importer reads.
//!
//! Every field the importer can live without is optional or defaulted, so a
//! sparse record still deserializes.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `GET /recipes/complexSearch`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SearchRecipe>,
    pub offset: Option<u64>,
    pub number: Option<u64>,
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecipe {
    pub id: i64,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub instructions: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub analyzed_instructions: Vec<AnalyzedInstruction>,
    pub servings: Option<f64>,
    pub ready_in_minutes: Option<f64>,
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cuisines: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub diets: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dish_types: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extended_ingredients: Vec<ExtendedIngredient>,
    pub nutrition: Option<NutritionInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzedInstruction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<InstructionStep>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructionStep {
    pub number: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub step: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedIngredient {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub name_clean: Option<String>,
    pub original: Option<String>,
    pub original_name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Vec<String>,
    pub measures: Option<Measures>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measures {
    pub metric: Option<Measure>,
    pub us: Option<Measure>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub amount: Option<f64>,
    pub unit_short: Option<String>,
    pub unit_long: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nutrients: Vec<Nutrient>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nutrient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
}

/// `GET /recipes/{id}/ingredientWidget.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientWidget {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<WidgetIngredient>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetIngredient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub amount: Option<WidgetAmount>,
    /// Cost in US cents, only present in the price widget
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetAmount {
    pub metric: Option<WidgetValue>,
    pub us: Option<WidgetValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetValue {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

/// `GET /recipes/{id}/nutritionWidget.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionWidget {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nutrients: Vec<Nutrient>,
}

/// `GET /recipes/{id}/priceBreakdownWidget.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceWidget {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<WidgetIngredient>,
    pub total_cost: Option<f64>,
    pub total_cost_per_serving: Option<f64>,
}
