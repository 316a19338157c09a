//! Spoonacular → SQLite import.
//!
//! Pages are fetched strictly in offset order and each page is written in a
//! single transaction. Records inside a page are processed in source order.

pub mod mapper;

use crate::config::ImportConfig;
use crate::db::{
    self,
    models::{NewChunk, NewPriceBreakdown},
    DbPool,
};
use crate::error::{Error, Result};
use crate::indexer::{price_chunk, Chunk, Chunker};
use crate::retrieval::{embedding::check_dims, Embedder};
use crate::spoonacular::{models::SearchRecipe, SpoonacularClient};
use mapper::CanonicalRecipe;
use serde::Serialize;
use sqlx::SqliteConnection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub pages: usize,
    pub imported: usize,
    pub price_breakdowns: usize,
    pub chunks: usize,
    /// Auxiliary fetches or embeddings that failed and were skipped
    pub auxiliary_failures: usize,
}

/// Auxiliary step names, used in logs
#[derive(Debug, Clone, Copy)]
enum Auxiliary {
    Ingredients,
    Nutrition,
    Price,
    Embedding,
}

pub struct Importer {
    pool: DbPool,
    client: SpoonacularClient,
    config: ImportConfig,
    chunker: Chunker,
    embedder: Option<Arc<dyn Embedder>>,
}

impl Importer {
    pub fn new(
        pool: DbPool,
        client: SpoonacularClient,
        config: ImportConfig,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Self {
        let chunker = Chunker::new(config.chunk_max_len);
        Self {
            pool,
            client,
            config,
            chunker,
            embedder,
        }
    }

    /// Import up to `total` recipes in pages of `page_size`.
    ///
    /// Stops early on an empty page. A failing page is rolled back and the
    /// error returned; pages committed before it stay in place.
    pub async fn import(
        &self,
        total: usize,
        page_size: usize,
        source_name: &str,
    ) -> Result<ImportReport> {
        if page_size == 0 {
            return Err(Error::Validation("Page size must be non-zero".to_string()));
        }

        let source = {
            let mut conn = self.pool.acquire().await?;
            db::sources::ensure_source(&mut conn, source_name).await?
        };

        info!(
            "Importing up to {} recipes from {} (page size {})",
            total, source.name, page_size
        );

        let mut report = ImportReport::default();

        while report.imported < total {
            let number = page_size.min(total - report.imported);
            let offset = self.config.start_offset + report.imported;

            let page = self.client.search_page(number, offset).await?;
            if page.is_empty() {
                info!("Empty page at offset {}, stopping", offset);
                break;
            }

            let mut tx = self.pool.begin().await?;

            match self.import_page(&mut *tx, source.id, &page, &mut report).await {
                Ok(()) => tx.commit().await?,
                Err(e) => {
                    error!(
                        "Import of page at offset {} failed, rolling back: {}",
                        offset,
                        e.log_safe()
                    );
                    if let Err(rollback) = tx.rollback().await {
                        warn!("Rollback failed: {}", rollback);
                    }
                    return Err(e);
                }
            }

            report.pages += 1;
            report.imported += page.len();
            info!("Imported {}/{}", report.imported, total);

            if report.imported < total && self.config.page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
            }
        }

        info!(
            "Import finished: {} recipes in {} pages, {} price breakdowns, {} auxiliary failures",
            report.imported, report.pages, report.price_breakdowns, report.auxiliary_failures
        );

        Ok(report)
    }

    async fn import_page(
        &self,
        conn: &mut SqliteConnection,
        source_id: i64,
        page: &[SearchRecipe],
        report: &mut ImportReport,
    ) -> Result<()> {
        for (i, record) in page.iter().enumerate() {
            if i > 0 && self.config.record_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.record_delay_ms)).await;
            }
            self.import_record(conn, source_id, record, report).await?;
        }
        Ok(())
    }

    /// Log and count a failed auxiliary step. Fatal errors are passed back.
    fn skip_auxiliary(
        &self,
        step: Auxiliary,
        recipe_id: i64,
        err: Error,
        report: &mut ImportReport,
    ) -> Result<()> {
        if err.is_fatal() {
            return Err(err);
        }
        warn!(
            "Skipping {:?} for recipe {}: {}",
            step,
            recipe_id,
            err.log_safe()
        );
        report.auxiliary_failures += 1;
        Ok(())
    }

    async fn import_record(
        &self,
        conn: &mut SqliteConnection,
        source_id: i64,
        record: &SearchRecipe,
        report: &mut ImportReport,
    ) -> Result<()> {
        let mut canonical = mapper::map_recipe(record, source_id, &self.config.lang);

        if canonical.ingredients.is_empty() && self.config.fetch_ingredient_details {
            match self.client.ingredient_widget(record.id).await {
                Ok(widget) => {
                    let (ingredients, lines) = mapper::map_widget_ingredients(&widget);
                    canonical.set_ingredients(ingredients, lines);
                }
                Err(e) => self.skip_auxiliary(Auxiliary::Ingredients, record.id, e, report)?,
            }
        }

        if canonical.nutrition.is_empty() && self.config.fetch_nutrition_details {
            match self.client.nutrition_widget(record.id).await {
                Ok(widget) => canonical.nutrition = mapper::map_nutrients(&widget.nutrients),
                Err(e) => self.skip_auxiliary(Auxiliary::Nutrition, record.id, e, report)?,
            }
        }

        let price = if self.config.fetch_price_breakdown {
            match self.client.price_widget(record.id).await {
                Ok(widget) => mapper::map_price(&widget),
                Err(e) => {
                    self.skip_auxiliary(Auxiliary::Price, record.id, e, report)?;
                    None
                }
            }
        } else {
            None
        };

        let recipe = db::recipes::upsert_recipe(&mut *conn, &canonical.recipe).await?;
        db::ingredients::upsert_recipe_ingredients(&mut *conn, recipe.id, &canonical.ingredients)
            .await?;

        db::nutrition::upsert_nutrition(&mut *conn, recipe.id, &canonical.nutrition).await?;

        if let Some(breakdown) = &price {
            db::prices::upsert_price_breakdown(&mut *conn, recipe.id, breakdown).await?;
            report.price_breakdowns += 1;
        }

        let chunks = self.build_chunks(&canonical, price.as_ref());
        let chunks = self.embed_chunks(chunks, record.id, report).await?;
        report.chunks += db::chunks::replace_chunks(&mut *conn, recipe.id, &chunks).await?;

        debug!(
            "Stored recipe {} ({}) as #{}",
            record.id, recipe.title, recipe.id
        );

        Ok(())
    }

    fn build_chunks(
        &self,
        canonical: &CanonicalRecipe,
        price: Option<&NewPriceBreakdown>,
    ) -> Vec<Chunk> {
        let mut chunks = self.chunker.chunk(
            &canonical.recipe.title,
            &canonical.ingredient_lines,
            canonical.recipe.instructions_plain.as_deref().unwrap_or_default(),
        );

        if let Some(chunk) = price.and_then(|p| price_chunk(p, self.config.price_top_n)) {
            chunks.push(chunk);
        }

        chunks
    }

    /// Attach embeddings to non-blank chunks when an embedder is configured
    async fn embed_chunks(
        &self,
        chunks: Vec<Chunk>,
        recipe_id: i64,
        report: &mut ImportReport,
    ) -> Result<Vec<NewChunk>> {
        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];

        if let Some(embedder) = &self.embedder {
            let (indices, texts): (Vec<usize>, Vec<String>) = chunks
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.content.trim().is_empty())
                .map(|(i, c)| (i, c.content.clone()))
                .unzip();

            let embedded = embedder.embed(&texts).await.and_then(|embedded| {
                check_dims(&**embedder, &embedded)?;
                Ok(embedded)
            });

            match embedded {
                Ok(embedded) => {
                    for (i, vector) in indices.into_iter().zip(embedded) {
                        vectors[i] = Some(vector);
                    }
                }
                Err(e) => self.skip_auxiliary(Auxiliary::Embedding, recipe_id, e, report)?,
            }
        }

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| NewChunk { chunk, embedding })
            .collect())
    }
}

/// Compute embeddings for stored chunks that have none, `batch_size` at a time.
/// Returns the number of chunks embedded.
pub async fn embed_missing_chunks(
    pool: &DbPool,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<usize> {
    let batch_size = batch_size.max(1);
    let mut embedded = 0;

    loop {
        let batch = db::chunks::list_chunks_missing_embeddings(pool, batch_size as i64).await?;
        if batch.is_empty() {
            break;
        }

        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        check_dims(embedder, &vectors)?;

        if vectors.len() != batch.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }

        for (chunk, vector) in batch.iter().zip(&vectors) {
            db::chunks::set_chunk_embedding(pool, chunk.id, vector).await?;
        }

        embedded += batch.len();
        debug!("Embedded {} chunks so far", embedded);
    }

    info!("Embedded {} chunks with {}", embedded, embedder.model_name());
    Ok(embedded)
}
