//! Turns Spoonacular payloads into the canonical records the store keeps.
//!
//! Field fallbacks are ordered strategy lists: the first strategy that yields
//! a non-blank value wins.

use crate::db::models::{
    NewPriceBreakdown, NewPriceItem, NewRecipe, NewRecipeIngredient, NutritionFacts,
};
use crate::indexer::signature;
use crate::spoonacular::models::{
    ExtendedIngredient, IngredientWidget, Nutrient, PriceWidget, SearchRecipe, WidgetIngredient,
};
use crate::utils::sanitize::sanitize_html;
use crate::utils::text::{html_to_text, normalize};
use std::collections::BTreeSet;

const UNTITLED: &str = "Untitled";

type Strategy<T> = fn(&T) -> Option<String>;

/// Recipe ready for storage, with the ingredient data the chunker and
/// signature need
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecipe {
    pub recipe: NewRecipe,
    pub ingredients: Vec<NewRecipeIngredient>,
    pub ingredient_lines: Vec<String>,
    pub nutrition: NutritionFacts,
}

impl CanonicalRecipe {
    /// Replace the ingredient list and recompute the signature
    pub fn set_ingredients(&mut self, ingredients: Vec<NewRecipeIngredient>, lines: Vec<String>) {
        self.ingredients = ingredients;
        self.ingredient_lines = lines;
        self.recipe.signature = recipe_signature(&self.recipe.title, &self.ingredients);
    }
}

fn first_of<T>(value: &T, strategies: &[Strategy<T>]) -> Option<String> {
    strategies
        .iter()
        .filter_map(|strategy| strategy(value))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn title(r: &SearchRecipe) -> Option<String> {
    r.title.clone()
}

fn instructions(r: &SearchRecipe) -> Option<String> {
    r.instructions.clone()
}

fn analyzed_steps(r: &SearchRecipe) -> Option<String> {
    let steps: Vec<&str> = r
        .analyzed_instructions
        .iter()
        .flat_map(|block| block.steps.iter())
        .map(|step| step.step.trim())
        .filter(|step| !step.is_empty())
        .collect();

    (!steps.is_empty()).then(|| steps.join("\n"))
}

fn summary(r: &SearchRecipe) -> Option<String> {
    r.summary.clone()
}

const TITLE: &[Strategy<SearchRecipe>] = &[title];
const INSTRUCTIONS: &[Strategy<SearchRecipe>] = &[instructions, analyzed_steps, summary];

fn original(i: &ExtendedIngredient) -> Option<String> {
    i.original.clone()
}

fn original_name(i: &ExtendedIngredient) -> Option<String> {
    i.original_name.clone()
}

fn name(i: &ExtendedIngredient) -> Option<String> {
    i.name.clone()
}

fn name_clean(i: &ExtendedIngredient) -> Option<String> {
    i.name_clean.clone()
}

const INGREDIENT_LINE: &[Strategy<ExtendedIngredient>] = &[original, original_name, name];
const INGREDIENT_NAME: &[Strategy<ExtendedIngredient>] =
    &[name, name_clean, original_name, original];

/// Grams for a quantity in a gram or kilogram unit
fn to_grams(amount: Option<f64>, unit: Option<&str>) -> Option<f64> {
    let amount = amount.filter(|a| a.is_finite())?;
    match normalize(unit?).as_str() {
        "g" | "gr" | "gram" | "grams" | "gramm" => Some(amount),
        "kg" | "kilogram" | "kilograms" | "kilogramm" => Some(amount * 1000.0),
        _ => None,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn map_ingredient(ingredient: &ExtendedIngredient) -> Option<(NewRecipeIngredient, String)> {
    let name = first_of(ingredient, INGREDIENT_NAME)?;
    let line = first_of(ingredient, INGREDIENT_LINE).unwrap_or_else(|| name.clone());

    let unit = non_blank(ingredient.unit.as_deref());
    let metric = ingredient.measures.as_ref().and_then(|m| m.metric.as_ref());
    let quantity_in_grams = metric
        .and_then(|m| to_grams(m.amount, m.unit_short.as_deref().or(m.unit_long.as_deref())))
        .or_else(|| to_grams(ingredient.amount, unit.as_deref()));

    let meta: Vec<&str> = ingredient
        .meta
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    let note = (!meta.is_empty()).then(|| meta.join(", "));

    Some((
        NewRecipeIngredient {
            name,
            quantity: ingredient.amount.filter(|a| a.is_finite()),
            unit,
            quantity_in_grams,
            note,
        },
        line,
    ))
}

/// Ingredient rows and display lines from a search record
pub fn map_ingredients(
    ingredients: &[ExtendedIngredient],
) -> (Vec<NewRecipeIngredient>, Vec<String>) {
    ingredients.iter().filter_map(map_ingredient).unzip()
}

fn map_widget_ingredient(ingredient: &WidgetIngredient) -> Option<(NewRecipeIngredient, String)> {
    let name = non_blank(Some(&ingredient.name))?;
    let metric = ingredient.amount.as_ref().and_then(|a| a.metric.as_ref());
    let quantity = metric.and_then(|m| m.value).filter(|v| v.is_finite());
    let unit = metric.and_then(|m| non_blank(m.unit.as_deref()));

    let line = [
        quantity.map(format_quantity),
        unit.clone(),
        Some(name.clone()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    Some((
        NewRecipeIngredient {
            quantity_in_grams: to_grams(quantity, unit.as_deref()),
            name,
            quantity,
            unit,
            note: None,
        },
        line,
    ))
}

/// Ingredient rows and display lines from the ingredient widget
pub fn map_widget_ingredients(widget: &IngredientWidget) -> (Vec<NewRecipeIngredient>, Vec<String>) {
    widget
        .ingredients
        .iter()
        .filter_map(map_widget_ingredient)
        .unzip()
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let rounded = format!("{value:.2}");
        rounded.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn find_nutrient<'a>(nutrients: &'a [Nutrient], names: &[&str]) -> Option<&'a Nutrient> {
    names
        .iter()
        .find_map(|wanted| nutrients.iter().find(|n| normalize(&n.name) == *wanted))
}

fn nutrient_amount(nutrients: &[Nutrient], names: &[&str]) -> Option<f64> {
    find_nutrient(nutrients, names)
        .and_then(|n| n.amount)
        .filter(|a| a.is_finite())
}

/// Nutrient facts by name, accepting the common synonyms
pub fn map_nutrients(nutrients: &[Nutrient]) -> NutritionFacts {
    let sodium_mg = find_nutrient(nutrients, &["sodium"]).and_then(|n| {
        let amount = n.amount.filter(|a| a.is_finite())?;
        match n.unit.as_deref().map(normalize).as_deref() {
            Some("g") => Some(amount * 1000.0),
            _ => Some(amount),
        }
    });

    NutritionFacts {
        kcal: nutrient_amount(nutrients, &["calories", "energy"]),
        protein_g: nutrient_amount(nutrients, &["protein"]),
        carbs_g: nutrient_amount(nutrients, &["carbohydrates", "carbs", "net carbohydrates"]),
        fat_g: nutrient_amount(nutrients, &["fat", "total fat"]),
        fiber_g: nutrient_amount(nutrients, &["fiber", "fibre", "dietary fiber"]),
        sugar_g: nutrient_amount(nutrients, &["sugar", "sugars"]),
        sodium_mg,
    }
}

fn to_cents(value: f64) -> i64 {
    value.round() as i64
}

/// Price breakdown from the price widget; `None` when it carries no cost data
pub fn map_price(widget: &PriceWidget) -> Option<NewPriceBreakdown> {
    let items = merge_price_items(widget.ingredients.iter().filter_map(|ingredient| {
        let name = non_blank(Some(&ingredient.name))?;
        let cost = ingredient.price.filter(|p| p.is_finite())?;
        let metric = ingredient.amount.as_ref().and_then(|a| a.metric.as_ref());
        Some(NewPriceItem {
            name,
            amount: metric.and_then(|m| m.value).filter(|v| v.is_finite()),
            unit: metric.and_then(|m| non_blank(m.unit.as_deref())),
            cost: to_cents(cost),
        })
    }));

    let total_cost = widget.total_cost.filter(|c| c.is_finite());
    if total_cost.is_none() && items.is_empty() {
        return None;
    }

    Some(NewPriceBreakdown {
        total_cost: total_cost
            .map(to_cents)
            .unwrap_or_else(|| items.iter().map(|i| i.cost).sum()),
        cost_per_serving: widget
            .total_cost_per_serving
            .filter(|c| c.is_finite())
            .map(to_cents)
            .unwrap_or(0),
        items,
    })
}

/// Items sharing (name, unit) are summed into the first occurrence
fn merge_price_items(items: impl Iterator<Item = NewPriceItem>) -> Vec<NewPriceItem> {
    let mut merged: Vec<NewPriceItem> = Vec::new();

    for item in items {
        match merged
            .iter_mut()
            .find(|m| m.name == item.name && m.unit == item.unit)
        {
            Some(existing) => {
                existing.cost += item.cost;
                existing.amount = match (existing.amount, item.amount) {
                    (None, None) => None,
                    (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
                };
            }
            None => merged.push(item),
        }
    }

    merged
}

/// Normalized, sorted, de-duplicated tag list
fn tags(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| normalize(v))
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn is_soup(record: &SearchRecipe, title: &str) -> bool {
    let normalized = normalize(title);
    record
        .dish_types
        .iter()
        .any(|d| normalize(d) == "soup")
        || normalized.contains("soup")
        || normalized.contains("suppe")
}

fn whole_number(value: Option<f64>) -> Option<i64> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as i64)
}

fn recipe_signature(title: &str, ingredients: &[NewRecipeIngredient]) -> String {
    let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
    signature(title, &names)
}

/// Map one search record onto the canonical recipe shape
pub fn map_recipe(record: &SearchRecipe, source_id: i64, lang: &str) -> CanonicalRecipe {
    let title = first_of(record, TITLE).unwrap_or_else(|| UNTITLED.to_string());
    let instructions_raw = first_of(record, INSTRUCTIONS);
    let instructions_plain = instructions_raw
        .as_deref()
        .map(html_to_text)
        .filter(|text| !text.is_empty());

    let (ingredients, ingredient_lines) = map_ingredients(&record.extended_ingredients);
    let nutrition = record
        .nutrition
        .as_ref()
        .map(|n| map_nutrients(&n.nutrients))
        .unwrap_or_default();

    let recipe = NewRecipe {
        source_id,
        source_recipe_id: record.id.to_string(),
        summary: non_blank(record.summary.as_deref()).map(|s| sanitize_html(&s)),
        instructions_raw,
        instructions_plain,
        servings: whole_number(record.servings),
        total_time_minutes: whole_number(record.ready_in_minutes),
        image_url: non_blank(record.image.as_deref()),
        cuisines: tags(&record.cuisines),
        diets: tags(&record.diets),
        intolerances: Vec::new(),
        lang: lang.to_string(),
        is_soup: is_soup(record, &title),
        signature: recipe_signature(&title, &ingredients),
        title,
    };

    CanonicalRecipe {
        recipe,
        ingredients,
        ingredient_lines,
        nutrition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spoonacular::models::{
        AnalyzedInstruction, InstructionStep, Measure, Measures, NutritionInfo, WidgetAmount,
        WidgetValue,
    };

    fn ingredient(name: &str, original: &str) -> ExtendedIngredient {
        ExtendedIngredient {
            name: Some(name.to_string()),
            original: Some(original.to_string()),
            ..Default::default()
        }
    }

    fn nutrient(name: &str, amount: f64, unit: &str) -> Nutrient {
        Nutrient {
            name: name.to_string(),
            amount: Some(amount),
            unit: Some(unit.to_string()),
        }
    }

    #[test]
    fn test_map_recipe_basic_fields() {
        let record = SearchRecipe {
            id: 42,
            title: Some("Tomato Soup".to_string()),
            instructions: Some("<ol><li>Chop</li><li>Boil</li></ol>".to_string()),
            servings: Some(4.0),
            ready_in_minutes: Some(30.0),
            cuisines: vec!["Italian".to_string(), " italian ".to_string()],
            diets: vec!["Vegan".to_string()],
            extended_ingredients: vec![
                ingredient("tomato", "3 tomatoes"),
                ingredient("salt", "1 tsp salt"),
            ],
            ..Default::default()
        };

        let canonical = map_recipe(&record, 1, "de");
        let recipe = &canonical.recipe;

        assert_eq!(recipe.source_recipe_id, "42");
        assert_eq!(recipe.title, "Tomato Soup");
        assert_eq!(recipe.instructions_plain.as_deref(), Some("Chop\nBoil"));
        assert_eq!(recipe.servings, Some(4));
        assert_eq!(recipe.total_time_minutes, Some(30));
        assert_eq!(recipe.cuisines, vec!["italian"]);
        assert_eq!(recipe.diets, vec!["vegan"]);
        assert!(recipe.intolerances.is_empty());
        assert_eq!(recipe.lang, "de");
        assert!(recipe.is_soup);
        assert_eq!(canonical.ingredient_lines, vec!["3 tomatoes", "1 tsp salt"]);
        assert_eq!(recipe.signature, signature("tomato soup", &["Salt", "Tomato"]));
    }

    #[test]
    fn test_title_and_instruction_fallbacks() {
        let record = SearchRecipe {
            id: 1,
            title: Some("   ".to_string()),
            analyzed_instructions: vec![AnalyzedInstruction {
                name: None,
                steps: vec![
                    InstructionStep {
                        number: Some(1),
                        step: "Slice leeks.".to_string(),
                    },
                    InstructionStep {
                        number: Some(2),
                        step: "Simmer.".to_string(),
                    },
                ],
            }],
            summary: Some("<b>Nice</b>".to_string()),
            ..Default::default()
        };

        let canonical = map_recipe(&record, 1, "de");
        assert_eq!(canonical.recipe.title, UNTITLED);
        assert_eq!(
            canonical.recipe.instructions_plain.as_deref(),
            Some("Slice leeks.\nSimmer.")
        );
        assert!(!canonical.recipe.is_soup);

        let summary_only = SearchRecipe {
            id: 2,
            title: Some("Kürbissuppe".to_string()),
            summary: Some("<p>Roast the squash.</p>".to_string()),
            ..Default::default()
        };
        let canonical = map_recipe(&summary_only, 1, "de");
        assert_eq!(
            canonical.recipe.instructions_raw.as_deref(),
            Some("<p>Roast the squash.</p>")
        );
        assert_eq!(
            canonical.recipe.instructions_plain.as_deref(),
            Some("Roast the squash.")
        );
        assert!(canonical.recipe.is_soup);
    }

    #[test]
    fn test_ingredient_fallbacks_grams_and_note() {
        let record = SearchRecipe {
            id: 3,
            title: Some("Stew".to_string()),
            dish_types: vec!["Soup".to_string()],
            extended_ingredients: vec![
                ExtendedIngredient {
                    name: None,
                    name_clean: Some("carrot".to_string()),
                    original: Some("2 carrots, peeled".to_string()),
                    amount: Some(2.0),
                    unit: Some(" ".to_string()),
                    meta: vec!["peeled".to_string(), "diced".to_string()],
                    measures: Some(Measures {
                        metric: Some(Measure {
                            amount: Some(0.2),
                            unit_short: Some("kg".to_string()),
                            unit_long: None,
                        }),
                        us: None,
                    }),
                    ..Default::default()
                },
                ExtendedIngredient {
                    original_name: Some("butter".to_string()),
                    amount: Some(50.0),
                    unit: Some("g".to_string()),
                    ..Default::default()
                },
                ExtendedIngredient::default(),
            ],
            ..Default::default()
        };

        let canonical = map_recipe(&record, 1, "de");
        assert!(canonical.recipe.is_soup);
        assert_eq!(canonical.ingredients.len(), 2);

        let carrot = &canonical.ingredients[0];
        assert_eq!(carrot.name, "carrot");
        assert_eq!(carrot.unit, None);
        assert_eq!(carrot.quantity_in_grams, Some(200.0));
        assert_eq!(carrot.note.as_deref(), Some("peeled, diced"));

        let butter = &canonical.ingredients[1];
        assert_eq!(butter.name, "butter");
        assert_eq!(butter.quantity_in_grams, Some(50.0));
        assert_eq!(canonical.ingredient_lines, vec!["2 carrots, peeled", "butter"]);
    }

    #[test]
    fn test_nutrient_synonyms_and_sodium() {
        let facts = map_nutrients(&[
            nutrient("Energy", 316.0, "kcal"),
            nutrient("Net Carbohydrates", 40.0, "g"),
            nutrient("Carbohydrates", 49.0, "g"),
            nutrient("Total Fat", 12.0, "g"),
            nutrient("Dietary Fiber", 5.0, "g"),
            nutrient("Sugars", 8.0, "g"),
            nutrient("Sodium", 1.2, "g"),
        ]);

        assert_eq!(facts.kcal, Some(316.0));
        assert_eq!(facts.carbs_g, Some(49.0));
        assert_eq!(facts.fat_g, Some(12.0));
        assert_eq!(facts.fiber_g, Some(5.0));
        assert_eq!(facts.sugar_g, Some(8.0));
        assert_eq!(facts.sodium_mg, Some(1200.0));
        assert_eq!(facts.protein_g, None);

        let facts = map_nutrients(&[nutrient("Salt", 2.0, "g")]);
        assert!(facts.is_empty());
    }

    #[test]
    fn test_nutrition_from_search_record() {
        let record = SearchRecipe {
            id: 4,
            nutrition: Some(NutritionInfo {
                nutrients: vec![nutrient("Calories", 120.0, "kcal"), nutrient("Sodium", 300.0, "mg")],
            }),
            ..Default::default()
        };
        let canonical = map_recipe(&record, 1, "en");
        assert_eq!(canonical.nutrition.kcal, Some(120.0));
        assert_eq!(canonical.nutrition.sodium_mg, Some(300.0));
        assert_eq!(canonical.recipe.lang, "en");
    }

    fn widget_ingredient(name: &str, value: f64, unit: &str, price: Option<f64>) -> WidgetIngredient {
        WidgetIngredient {
            name: name.to_string(),
            amount: Some(WidgetAmount {
                metric: Some(WidgetValue {
                    value: Some(value),
                    unit: Some(unit.to_string()),
                }),
                us: None,
            }),
            price,
        }
    }

    #[test]
    fn test_widget_ingredients_replace_signature() {
        let record = SearchRecipe {
            id: 5,
            title: Some("Leek Soup".to_string()),
            ..Default::default()
        };
        let mut canonical = map_recipe(&record, 1, "de");
        let empty_signature = canonical.recipe.signature.clone();

        let widget = IngredientWidget {
            ingredients: vec![
                widget_ingredient("leek", 2.0, "", None),
                widget_ingredient("potato", 0.5, "kg", None),
            ],
        };
        let (ingredients, lines) = map_widget_ingredients(&widget);
        canonical.set_ingredients(ingredients, lines);

        assert_eq!(canonical.ingredient_lines, vec!["2 leek", "0.5 kg potato"]);
        assert_eq!(canonical.ingredients[1].quantity_in_grams, Some(500.0));
        assert_ne!(canonical.recipe.signature, empty_signature);
        assert_eq!(
            canonical.recipe.signature,
            signature("Leek Soup", &["potato", "leek"])
        );
    }

    #[test]
    fn test_map_price() {
        let widget = PriceWidget {
            ingredients: vec![
                widget_ingredient("tomato", 400.0, "g", Some(120.4)),
                widget_ingredient("salt", 1.0, "tsp", Some(0.6)),
                widget_ingredient("water", 1.0, "l", None),
            ],
            total_cost: Some(250.3),
            total_cost_per_serving: Some(62.58),
        };

        let breakdown = map_price(&widget).unwrap();
        assert_eq!(breakdown.total_cost, 250);
        assert_eq!(breakdown.cost_per_serving, 63);
        assert_eq!(breakdown.items.len(), 2);
        assert_eq!(breakdown.items[0].cost, 120);
        assert_eq!(breakdown.items[1].cost, 1);
        assert_eq!(breakdown.items[0].unit.as_deref(), Some("g"));

        assert!(map_price(&PriceWidget::default()).is_none());
    }

    #[test]
    fn test_map_price_merges_repeated_items() {
        let widget = PriceWidget {
            ingredients: vec![
                widget_ingredient("tomato", 200.0, "g", Some(60.0)),
                widget_ingredient("salt", 1.0, "tsp", Some(1.0)),
                widget_ingredient("tomato", 100.0, "g", Some(30.0)),
                widget_ingredient("tomato", 2.0, "cans", Some(80.0)),
            ],
            total_cost: Some(171.0),
            total_cost_per_serving: Some(42.75),
        };

        let breakdown = map_price(&widget).unwrap();
        assert_eq!(breakdown.items.len(), 3);
        assert_eq!(breakdown.items[0].name, "tomato");
        assert_eq!(breakdown.items[0].cost, 90);
        assert_eq!(breakdown.items[0].amount, Some(300.0));
        assert_eq!(breakdown.items[2].unit.as_deref(), Some("cans"));

        let chunk = crate::indexer::price_chunk(&breakdown, 1).unwrap();
        assert!(chunk.content.ends_with("- tomato: $0.90"));
    }
}
