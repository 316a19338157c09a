#![allow(dead_code)]

use async_trait::async_trait;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use soupmate::config::{
    DatabaseConfig, EmbeddingConfig, ImportConfig, RetrievalConfig, ServerConfig, Settings,
    SpoonacularConfig,
};
use soupmate::retrieval::{Embedder, KeywordScope};
use soupmate::Result;

/// Settings pointing the Spoonacular client at a mock server, with no pacing
pub fn settings(base_url: &str) -> Settings {
    Settings {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origin: "http://localhost:4200".to_string(),
        },
        spoonacular: SpoonacularConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.to_string(),
            search_query: "soup".to_string(),
            sort: "popularity".to_string(),
            requests_per_second: 1000,
            retry_after_secs: 0,
            timeout_secs: 5,
            user_agent: "soupmate-tests".to_string(),
        },
        import: ImportConfig {
            total: 1,
            page_size: 1,
            source_name: "Spoonacular".to_string(),
            start_offset: 0,
            page_delay_ms: 0,
            record_delay_ms: 0,
            lang: "de".to_string(),
            fetch_ingredient_details: true,
            fetch_nutrition_details: true,
            fetch_price_breakdown: true,
            price_top_n: 5,
            chunk_max_len: 1000,
        },
        embedding: EmbeddingConfig {
            api_url: None,
            api_key: None,
            model: "test-model".to_string(),
            dims: 3,
            timeout_secs: 5,
            max_retries: 0,
            batch_size: 2,
        },
        retrieval: RetrievalConfig {
            top_k: 5,
            max_top_k: 50,
            hybrid_alpha: 0.7,
            min_vector_score: 0.5,
            keyword_scope: KeywordScope::QueryOnly,
            remove_stop_words: false,
        },
    }
}

/// Three-dimensional embedding keyed on topic words: tomato, leek, everything else
pub struct TopicEmbedder;

pub fn topic_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    vec![
        if lower.contains("tomato") { 1.0 } else { 0.0 },
        if lower.contains("leek") { 1.0 } else { 0.0 },
        0.1,
    ]
}

#[async_trait]
impl Embedder for TopicEmbedder {
    fn model_name(&self) -> &str {
        "topic"
    }

    fn dims(&self) -> usize {
        3
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| topic_vector(t)).collect())
    }
}

pub fn tomato_soup() -> Value {
    json!({
        "id": 42,
        "title": "Tomato Soup",
        "summary": "A <b>warming</b> soup.",
        "instructions": "<ol><li>Chop the tomatoes.</li><li>Simmer for 20 minutes.</li></ol>",
        "servings": 4,
        "readyInMinutes": 30,
        "image": "https://img.spoonacular.com/recipes/42-556x370.jpg",
        "cuisines": ["Italian"],
        "diets": ["vegan"],
        "dishTypes": ["soup"],
        "extendedIngredients": [
            {"id": 1, "name": "tomato", "original": "3 tomatoes", "amount": 3, "unit": "", "meta": []},
            {"id": 2, "name": "salt", "original": "1 tsp salt", "amount": 1, "unit": "tsp", "meta": ["to taste"]}
        ],
        "nutrition": {
            "nutrients": [
                {"name": "Calories", "amount": 120.5, "unit": "kcal"},
                {"name": "Protein", "amount": 3.2, "unit": "g"},
                {"name": "Sodium", "amount": 480, "unit": "mg"}
            ]
        }
    })
}

/// Minimal soup record with instructions, ingredients and nutrients
pub fn simple_soup(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "instructions": format!("Cook the {title}."),
        "extendedIngredients": [{"name": "water", "original": "1 l water"}],
        "nutrition": {"nutrients": [{"name": "Calories", "amount": 80, "unit": "kcal"}]}
    })
}

pub fn price_widget() -> Value {
    json!({
        "ingredients": [
            {"name": "tomato", "amount": {"metric": {"value": 300, "unit": "g"}}, "price": 150.2},
            {"name": "salt", "amount": {"metric": {"value": 1, "unit": "tsp"}}, "price": 1.1}
        ],
        "totalCost": 151.3,
        "totalCostPerServing": 37.83
    })
}

pub async fn mock_search(server: &mut ServerGuard, offset: &str, results: Vec<Value>) -> Mock {
    server
        .mock("GET", "/recipes/complexSearch")
        .match_query(Matcher::UrlEncoded("offset".into(), offset.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "results": results }).to_string())
        .create_async()
        .await
}

pub async fn mock_price(server: &mut ServerGuard, recipe_id: i64, status: usize, body: Value) -> Mock {
    server
        .mock(
            "GET",
            format!("/recipes/{recipe_id}/priceBreakdownWidget.json").as_str(),
        )
        .match_query(Matcher::Any)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}
