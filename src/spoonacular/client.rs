use crate::config::SpoonacularConfig;
use crate::spoonacular::{
    models::{IngredientWidget, NutritionWidget, PriceWidget, SearchRecipe, SearchResponse},
    rate_limiter::RateLimiter,
};
use crate::utils::sanitize::truncate;
use crate::{Error, Result};
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Spoonacular REST client.
///
/// Every request goes through the shared [`RateLimiter`]. A 429 is waited out
/// and retried once; 401 and 402 surface as fatal errors.
#[derive(Clone)]
pub struct SpoonacularClient {
    client: Client,
    base_url: String,
    api_key: String,
    search_query: String,
    sort: String,
    retry_after: Duration,
    rate_limiter: Arc<RateLimiter>,
}

impl SpoonacularClient {
    pub fn new(config: &SpoonacularConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            search_query: config.search_query.clone(),
            sort: config.sort.clone(),
            retry_after: Duration::from_secs(config.retry_after_secs),
            rate_limiter: Arc::new(RateLimiter::new(config.requests_per_second)),
        })
    }

    async fn send(&self, url: &str, params: &[(&str, String)]) -> Result<Response> {
        self.rate_limiter.wait().await;

        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        Ok(response)
    }

    /// GET with the single 429 retry
    async fn get<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Spoonacular request: GET {}", path);

        let mut response = self.send(&url, params).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(&response).unwrap_or(self.retry_after);
            warn!("Spoonacular rate limit hit on {}, retrying in {:?}", path, wait);
            tokio::time::sleep(wait).await;

            response = self.send(&url, params).await?;
        }

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            error!("Spoonacular API error on {}: {}", path, status);
            debug!("Spoonacular error body: {}", truncate(&error_body, 500));

            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    Error::Unauthorized("Spoonacular rejected the API key".to_string())
                }
                StatusCode::PAYMENT_REQUIRED => {
                    Error::QuotaExceeded("Spoonacular daily quota exhausted".to_string())
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    Error::RateLimited(format!("Spoonacular still rate limiting {path}"))
                }
                StatusCode::NOT_FOUND => Error::NotFound(format!("Spoonacular resource {path}")),
                _ => Error::Upstream {
                    status: status.as_u16(),
                    message: truncate(&error_body, 200),
                },
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// One page of the recipe search, with full recipe information included
    pub async fn search_page(&self, number: usize, offset: usize) -> Result<Vec<SearchRecipe>> {
        let params = [
            ("query", self.search_query.clone()),
            ("number", number.to_string()),
            ("offset", offset.to_string()),
            ("addRecipeInformation", "true".to_string()),
            ("addRecipeNutrition", "true".to_string()),
            ("fillIngredients", "true".to_string()),
            ("instructionsRequired", "true".to_string()),
            ("sort", self.sort.clone()),
        ];

        let response: SearchResponse = self.get("/recipes/complexSearch", &params).await?;
        Ok(response.results)
    }

    pub async fn ingredient_widget(&self, recipe_id: i64) -> Result<IngredientWidget> {
        self.get(&format!("/recipes/{recipe_id}/ingredientWidget.json"), &[])
            .await
    }

    pub async fn nutrition_widget(&self, recipe_id: i64) -> Result<NutritionWidget> {
        self.get(&format!("/recipes/{recipe_id}/nutritionWidget.json"), &[])
            .await
    }

    pub async fn price_widget(&self, recipe_id: i64) -> Result<PriceWidget> {
        self.get(&format!("/recipes/{recipe_id}/priceBreakdownWidget.json"), &[])
            .await
    }
}

/// `Retry-After` in seconds, when the server sent one
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
