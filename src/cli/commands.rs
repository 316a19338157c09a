use crate::config::Settings;
use crate::db::{self, DbPool};
use crate::importer::{embed_missing_chunks, ImportReport, Importer};
use crate::retrieval::{ChatAnswer, Embedder, HttpEmbedder, HybridRetriever, SqliteSearchService};
use crate::spoonacular::SpoonacularClient;
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Embedder from settings, or `None` when no embedding API is configured
pub fn optional_embedder(settings: &Settings) -> Result<Option<Arc<dyn Embedder>>> {
    if settings.embedding.api_url.is_none() {
        return Ok(None);
    }
    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&settings.embedding)?);
    Ok(Some(embedder))
}

/// Retriever over the local store, backed by the configured embedding API
pub fn build_retriever(pool: &DbPool, settings: &Settings) -> Result<HybridRetriever> {
    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&settings.embedding)?);
    let search = Arc::new(SqliteSearchService::new(pool.clone(), &settings.retrieval));

    Ok(HybridRetriever::new(
        pool.clone(),
        embedder,
        search,
        &settings.retrieval,
    ))
}

/// Run one import with the configured client
pub async fn import(pool: &DbPool, settings: &Settings) -> Result<ImportReport> {
    let client = SpoonacularClient::new(&settings.spoonacular)?;
    let embedder = optional_embedder(settings)?;
    if embedder.is_none() {
        warn!("EMBEDDING_API_URL is not set, chunks are stored without embeddings");
    }

    let importer = Importer::new(pool.clone(), client, settings.import.clone(), embedder);
    let report = importer
        .import(
            settings.import.total,
            settings.import.page_size,
            &settings.import.source_name,
        )
        .await?;

    let duplicates = db::recipes::list_duplicate_signatures(pool).await?;
    if !duplicates.is_empty() {
        info!(
            "{} signatures are shared by more than one recipe",
            duplicates.len()
        );
    }

    Ok(report)
}

pub async fn embed(pool: &DbPool, settings: &Settings, batch_size: usize) -> Result<usize> {
    let embedder = HttpEmbedder::new(&settings.embedding)?;
    embed_missing_chunks(pool, &embedder, batch_size).await
}

pub async fn search(
    pool: &DbPool,
    settings: &Settings,
    query: &str,
    top_k: usize,
) -> Result<ChatAnswer> {
    let retriever = build_retriever(pool, settings)?;
    retriever.answer(query, top_k).await
}

pub fn print_import_report(report: &ImportReport) {
    println!("\x1b[32m\u{2713}\x1b[0m Import complete");
    println!("  Recipes:            {}", report.imported);
    println!("  Pages:              {}", report.pages);
    println!("  Chunks:             {}", report.chunks);
    println!("  Price breakdowns:   {}", report.price_breakdowns);
    if report.auxiliary_failures > 0 {
        println!(
            "  \x1b[33mSkipped auxiliary steps: {}\x1b[0m",
            report.auxiliary_failures
        );
    }
}

pub fn print_answer(answer: &ChatAnswer) {
    if answer.recipes.is_empty() {
        println!("{}", answer.answer);
        return;
    }

    println!("Found {} recipes:\n", answer.recipes.len());
    for recipe in &answer.recipes {
        println!("\x1b[1m{}\x1b[0m (#{})", recipe.title, recipe.id);
        for line in recipe.instructions.lines() {
            println!("  {line}");
        }
        println!();
    }
}
