use crate::config::RetrievalConfig;
use crate::db::{recipes, DbPool};
use crate::error::{Error, Result};
use crate::retrieval::embedding::{check_dims, Embedder};
use crate::retrieval::keywords::{KeywordExtractor, KeywordScope};
use crate::retrieval::search::SearchService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A hydrated search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRecipe {
    pub id: i64,
    pub title: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub recipes: Vec<RetrievedRecipe>,
}

/// Embeds the query, asks the search service for candidates and hydrates them
/// from the store. Read-only against the database.
#[derive(Clone)]
pub struct HybridRetriever {
    pool: DbPool,
    embedder: Arc<dyn Embedder>,
    search: Arc<dyn SearchService>,
    extractor: KeywordExtractor,
    scope: KeywordScope,
    default_top_k: usize,
    max_top_k: usize,
}

impl HybridRetriever {
    pub fn new(
        pool: DbPool,
        embedder: Arc<dyn Embedder>,
        search: Arc<dyn SearchService>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            pool,
            embedder,
            search,
            extractor: KeywordExtractor::new(config.remove_stop_words),
            scope: config.keyword_scope,
            default_top_k: config.top_k,
            max_top_k: config.max_top_k,
        }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Keyword list sent along with the query embedding
    pub async fn keywords(&self, query: &str) -> Result<Vec<String>> {
        let mut keywords = self.extractor.extract(query);

        if self.scope == KeywordScope::QueryAndCorpus {
            keywords.extend(self.extractor.corpus_keywords(&self.pool).await?);
        }

        Ok(keywords.into_iter().collect())
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedRecipe>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("Query must not be empty".to_string()));
        }

        let top_k = top_k.min(self.max_top_k);
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_one(query).await?;
        check_dims(&*self.embedder, std::slice::from_ref(&embedding))?;
        let keywords = self.keywords(query).await?;

        let candidates = self
            .search
            .match_recipes(&embedding, &keywords, top_k)
            .await?;

        tracing::debug!(
            "Search for {:?} returned {} candidates ({} keywords, scope {})",
            query,
            candidates.len(),
            keywords.len(),
            self.scope
        );

        let mut results = Vec::with_capacity(candidates.len());

        for candidate in candidates.into_iter().take(top_k) {
            let Some(recipe) = recipes::find_recipe(&self.pool, candidate.recipe_id).await? else {
                tracing::debug!("Dropping candidate {}: recipe not found", candidate.recipe_id);
                continue;
            };

            let instructions = recipe
                .instructions_plain
                .as_deref()
                .map(str::trim)
                .unwrap_or_default();

            if recipe.title.trim().is_empty() || instructions.is_empty() {
                tracing::debug!(
                    "Dropping candidate {}: missing title or instructions",
                    recipe.id
                );
                continue;
            }

            results.push(RetrievedRecipe {
                id: recipe.id,
                title: recipe.title.clone(),
                instructions: instructions.to_string(),
            });
        }

        Ok(results)
    }

    pub async fn answer(&self, query: &str, top_k: usize) -> Result<ChatAnswer> {
        let recipes = self.search(query, top_k).await?;
        Ok(ChatAnswer {
            answer: format_answer(&recipes),
            recipes,
        })
    }
}

/// Titles comma-separated, then each recipe's instructions separated by blank lines
pub fn format_answer(recipes: &[RetrievedRecipe]) -> String {
    if recipes.is_empty() {
        return "No matching recipes found.".to_string();
    }

    let titles = recipes
        .iter()
        .map(|r| r.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let instructions = recipes
        .iter()
        .map(|r| r.instructions.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Matching recipes: {titles}\n\n{instructions}")
}
