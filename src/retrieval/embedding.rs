//! Text embeddings for chunk and query vectors.
//!
//! [`HttpEmbedder`] talks to any OpenAI-compatible `/embeddings` endpoint.
//! Vectors are stored in SQLite as little-endian `f32` BLOBs, see
//! [`vec_to_blob`] and [`blob_to_vec`].

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dims(&self) -> usize;

    /// Embed every text, returning vectors in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Empty embedding response".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI-compatible embeddings client.
///
/// Retries HTTP 429, 5xx and network errors with exponential backoff
/// (1s, 2s, 4s, ...); other client errors fail immediately.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dims: usize,
    max_retries: u32,
    backoff_base: Duration,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_url = config.require_api_url()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", api_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dims: config.dims,
            max_retries: config.max_retries,
            backoff_base: Duration::from_secs(1),
        })
    }

    /// Override the first retry delay (tests use zero)
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_base * (1u32 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Embedding request failed (attempt {}): {}", attempt + 1, e);
                    last_err = Some(Error::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.is_success() {
                let parsed: EmbeddingResponse = response.json().await?;
                return self.collect_vectors(parsed, texts.len());
            }

            let body_text = response.text().await.unwrap_or_default();
            let err = Error::Embedding(format!("Embedding API returned {status}: {body_text}"));

            if status.as_u16() == 429 || status.is_server_error() {
                tracing::warn!("Embedding API returned {} (attempt {})", status, attempt + 1);
                last_err = Some(err);
                continue;
            }

            return Err(err);
        }

        Err(last_err
            .unwrap_or_else(|| Error::Embedding("Embedding failed after retries".to_string())))
    }

    fn collect_vectors(&self, mut parsed: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
        if parsed.data.len() != expected {
            return Err(Error::Embedding(format!(
                "Expected {expected} embeddings, got {}",
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);

        parsed
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() != self.dims {
                    return Err(Error::Embedding(format!(
                        "Expected {} dimensions, got {}",
                        self.dims,
                        d.embedding.len()
                    )));
                }
                Ok(d.embedding)
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Embedding {} texts with {}", texts.len(), self.model);
        self.request(texts).await
    }
}

/// Encode a vector as little-endian `f32` bytes
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB written by [`vec_to_blob`]. Trailing partial values are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Reject vectors whose length differs from the embedder's configured dimensions
pub fn check_dims(embedder: &dyn Embedder, vectors: &[Vec<f32>]) -> Result<()> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dims()) {
        return Err(Error::Embedding(format!(
            "{} returned {} dimensions, expected {}",
            embedder.model_name(),
            bad.len(),
            embedder.dims()
        )));
    }
    Ok(())
}

/// Cosine similarity in `[-1.0, 1.0]`; `0.0` for empty, zero or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
