use crate::config::RetrievalConfig;
use crate::db::{chunks, DbPool};
use crate::error::Result;
use crate::retrieval::embedding::{blob_to_vec, cosine_similarity};
use crate::retrieval::keywords::KeywordExtractor;
use async_trait::async_trait;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// A ranked recipe as returned by a search service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub recipe_id: i64,
    pub title: String,
    pub score: f32,
}

/// Ranks stored recipes against an embedded query and its keywords.
/// Returns at most `limit` candidates by descending score.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn match_recipes(
        &self,
        embedding: &[f32],
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<Candidate>>;
}

#[derive(Debug, Default)]
struct RecipeScore {
    title: String,
    vector: f32,
    keyword: f32,
}

/// Brute-force hybrid ranking over the chunk table
pub struct SqliteSearchService {
    pool: DbPool,
    alpha: f32,
    min_vector_score: f32,
    extractor: KeywordExtractor,
}

impl SqliteSearchService {
    pub fn new(pool: DbPool, config: &RetrievalConfig) -> Self {
        Self {
            pool,
            alpha: config.hybrid_alpha.clamp(0.0, 1.0),
            min_vector_score: config.min_vector_score,
            extractor: KeywordExtractor::default(),
        }
    }

    fn keyword_overlap(&self, content: &str, keywords: &[String]) -> f32 {
        if keywords.is_empty() {
            return 0.0;
        }

        let chunk_keywords: BTreeSet<String> = self.extractor.extract(content);
        let hits = keywords
            .iter()
            .filter(|k| chunk_keywords.contains(k.as_str()))
            .count();

        hits as f32 / keywords.len() as f32
    }
}

#[async_trait]
impl SearchService for SqliteSearchService {
    async fn match_recipes(
        &self,
        embedding: &[f32],
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let stored = chunks::list_searchable_chunks(&self.pool).await?;
        let mut scores: HashMap<i64, RecipeScore> = HashMap::new();

        for chunk in stored {
            let vector = chunk
                .embedding
                .as_deref()
                .map(|blob| cosine_similarity(embedding, &blob_to_vec(blob)))
                .unwrap_or(0.0);
            let keyword = self.keyword_overlap(&chunk.content, keywords);

            let entry = scores.entry(chunk.recipe_id).or_insert_with(|| RecipeScore {
                title: chunk.title.clone(),
                ..Default::default()
            });
            entry.vector = entry.vector.max(vector);
            entry.keyword = entry.keyword.max(keyword);
        }

        let mut candidates: Vec<Candidate> = scores
            .into_iter()
            .filter(|(_, s)| {
                keywords.is_empty() || s.keyword > 0.0 || s.vector >= self.min_vector_score
            })
            .map(|(recipe_id, s)| Candidate {
                recipe_id,
                title: s.title,
                score: self.alpha * s.vector + (1.0 - self.alpha) * s.keyword,
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.recipe_id.cmp(&b.recipe_id))
        });
        candidates.truncate(limit);

        tracing::debug!(
            "Matched {} candidates for {} keywords",
            candidates.len(),
            keywords.len()
        );

        Ok(candidates)
    }
}
