mod common;

use async_trait::async_trait;
use common::*;
use soupmate::db::models::{NewChunk, NewRecipe};
use soupmate::db::{self, chunks, recipes, sources, DbPool};
use soupmate::indexer::chunk;
use soupmate::retrieval::{
    Candidate, HybridRetriever, KeywordScope, SearchService, SqliteSearchService,
};
use soupmate::{Error, Result};
use std::sync::{Arc, Mutex};

async fn seed(pool: &DbPool, id: &str, title: &str, instructions: Option<&str>) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    let source = sources::ensure_source(&mut conn, "Spoonacular").await.unwrap();
    let recipe = recipes::upsert_recipe(
        &mut conn,
        &NewRecipe {
            source_id: source.id,
            source_recipe_id: id.to_string(),
            title: title.to_string(),
            summary: None,
            instructions_raw: instructions.map(str::to_string),
            instructions_plain: instructions.map(str::to_string),
            servings: None,
            total_time_minutes: None,
            image_url: None,
            cuisines: vec![],
            diets: vec![],
            intolerances: vec![],
            lang: "de".to_string(),
            is_soup: true,
            signature: id.to_string(),
        },
    )
    .await
    .unwrap();

    let new_chunks: Vec<NewChunk> = chunk(title, &[] as &[&str], instructions.unwrap_or(""))
        .into_iter()
        .map(|chunk| NewChunk {
            embedding: Some(topic_vector(&chunk.content)),
            chunk,
        })
        .collect();
    chunks::replace_chunks(&mut conn, recipe.id, &new_chunks)
        .await
        .unwrap();

    recipe.id
}

fn retriever(pool: &DbPool, search: Arc<dyn SearchService>, scope: KeywordScope) -> HybridRetriever {
    let mut config = settings("http://127.0.0.1:1").retrieval;
    config.keyword_scope = scope;
    HybridRetriever::new(pool.clone(), Arc::new(TopicEmbedder), search, &config)
}

fn sqlite_retriever(pool: &DbPool) -> HybridRetriever {
    let config = settings("http://127.0.0.1:1").retrieval;
    let search = Arc::new(SqliteSearchService::new(pool.clone(), &config));
    retriever(pool, search, KeywordScope::QueryOnly)
}

/// Returns fixed candidates and records the keywords it was asked for
struct StubSearch {
    candidates: Vec<Candidate>,
    seen_keywords: Mutex<Vec<String>>,
}

impl StubSearch {
    fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            seen_keywords: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchService for StubSearch {
    async fn match_recipes(
        &self,
        _embedding: &[f32],
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        *self.seen_keywords.lock().unwrap() = keywords.to_vec();
        Ok(self.candidates.iter().take(limit).cloned().collect())
    }
}

fn candidate(recipe_id: i64, score: f32) -> Candidate {
    Candidate {
        recipe_id,
        title: String::new(),
        score,
    }
}

#[tokio::test]
async fn test_search_ranks_by_topic_and_respects_top_k() {
    let pool = db::init_memory_pool().await.unwrap();
    let tomato = seed(&pool, "1", "Tomato Soup", Some("Simmer the tomato.")).await;
    seed(&pool, "2", "Leek Soup", Some("Slice the leek.")).await;
    seed(&pool, "3", "Pea Soup", Some("Boil the peas.")).await;

    let retriever = sqlite_retriever(&pool);

    let results = retriever.search("tomato soup", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, tomato);
    assert_eq!(results[0].instructions, "Simmer the tomato.");

    let results = retriever.search("soup", 1).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_answer_without_matches() {
    let pool = db::init_memory_pool().await.unwrap();
    seed(&pool, "2", "Leek Soup", Some("Slice the leek.")).await;

    let answer = sqlite_retriever(&pool)
        .answer("chocolate cake", 5)
        .await
        .unwrap();

    assert!(answer.recipes.is_empty());
    assert_eq!(answer.answer, "No matching recipes found.");
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let pool = db::init_memory_pool().await.unwrap();
    let err = sqlite_retriever(&pool).search("  ", 5).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_hydration_misses_are_dropped() {
    let pool = db::init_memory_pool().await.unwrap();
    let complete = seed(&pool, "1", "Tomato Soup", Some("Simmer the tomato.")).await;
    let no_instructions = seed(&pool, "2", "Leek Soup", None).await;
    let blank_instructions = seed(&pool, "3", "Pea Soup", Some("   ")).await;

    let search = Arc::new(StubSearch::new(vec![
        candidate(999, 0.9),
        candidate(no_instructions, 0.8),
        candidate(complete, 0.7),
        candidate(blank_instructions, 0.6),
    ]));
    let retriever = retriever(&pool, search, KeywordScope::QueryOnly);

    let answer = retriever.answer("soup", 4).await.unwrap();
    assert_eq!(answer.recipes.len(), 1);
    assert_eq!(answer.recipes[0].id, complete);
    assert_eq!(
        answer.answer,
        "Matching recipes: Tomato Soup\n\nSimmer the tomato."
    );
}

#[tokio::test]
async fn test_keyword_scope_controls_keywords() {
    let pool = db::init_memory_pool().await.unwrap();
    seed(&pool, "1", "Tomato Soup", Some("Simmer gently.")).await;

    let search = Arc::new(StubSearch::new(vec![]));
    retriever(&pool, search.clone(), KeywordScope::QueryOnly)
        .search("Leek soup", 5)
        .await
        .unwrap();
    assert_eq!(
        *search.seen_keywords.lock().unwrap(),
        vec!["leek".to_string(), "soup".to_string()]
    );

    let search = Arc::new(StubSearch::new(vec![]));
    retriever(&pool, search.clone(), KeywordScope::QueryAndCorpus)
        .search("Leek soup", 5)
        .await
        .unwrap();
    assert_eq!(
        *search.seen_keywords.lock().unwrap(),
        vec!["gently", "leek", "simmer", "soup", "tomato"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_top_k_is_capped() {
    let pool = db::init_memory_pool().await.unwrap();
    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(seed(&pool, &i.to_string(), &format!("Soup {i}"), Some("Stir.")).await);
    }

    let search = Arc::new(StubSearch::new(
        ids.iter().map(|&id| candidate(id, 0.5)).collect(),
    ));
    let mut config = settings("http://127.0.0.1:1").retrieval;
    config.max_top_k = 2;
    let retriever = HybridRetriever::new(pool.clone(), Arc::new(TopicEmbedder), search, &config);

    assert_eq!(retriever.search("soup", 10).await.unwrap().len(), 2);
    assert!(retriever.search("soup", 0).await.unwrap().is_empty());
}
