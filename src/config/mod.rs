use crate::error::{Error, Result};
use crate::retrieval::keywords::KeywordScope;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub spoonacular: SpoonacularConfig,
    pub import: ImportConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origin: String,
}

/// Connection settings for the Spoonacular recipe API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoonacularConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub search_query: String,
    pub sort: String,
    pub requests_per_second: u64,
    /// Wait before the single retry of a 429 response (unless Retry-After says otherwise)
    pub retry_after_secs: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub total: usize,
    pub page_size: usize,
    pub source_name: String,
    pub start_offset: usize,
    pub page_delay_ms: u64,
    pub record_delay_ms: u64,
    pub lang: String,
    pub fetch_ingredient_details: bool,
    pub fetch_nutrition_details: bool,
    pub fetch_price_breakdown: bool,
    pub price_top_n: usize,
    pub chunk_max_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub api_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub dims: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub max_top_k: usize,
    pub hybrid_alpha: f32,
    pub min_vector_score: f32,
    pub keyword_scope: KeywordScope,
    pub remove_stop_words: bool,
}

/// Read an environment variable, falling back to `default` when unset
fn env_or<T: FromStr>(name: &str, default: &str) -> Result<T> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {name} value")))
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let database = DatabaseConfig {
            url: env_or("DATABASE_URL", "sqlite:./data/soupmate.db")?,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", "5")?,
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", "1")?,
            connection_timeout_seconds: env_or("DATABASE_CONNECTION_TIMEOUT", "30")?,
            idle_timeout_seconds: env_or("DATABASE_IDLE_TIMEOUT", "600")?,
        };

        let server = ServerConfig {
            host: env_or("HOST", "0.0.0.0")?,
            port: env_or("PORT", "8000")?,
            cors_allowed_origin: env_or("CORS_ALLOWED_ORIGIN", "http://localhost:4200")?,
        };

        let spoonacular = SpoonacularConfig {
            api_key: env_opt("SPOONACULAR_API_KEY"),
            base_url: env_or("SPOONACULAR_BASE_URL", "https://api.spoonacular.com")?,
            search_query: env_or("SPOONACULAR_QUERY", "soup")?,
            sort: env_or("SPOONACULAR_SORT", "popularity")?,
            requests_per_second: env_or("SPOONACULAR_REQUESTS_PER_SECOND", "1")?,
            retry_after_secs: env_or("SPOONACULAR_RETRY_AFTER_SECS", "60")?,
            timeout_secs: env_or("SPOONACULAR_TIMEOUT_SECS", "30")?,
            user_agent: format!("SoupMate/{}", env!("CARGO_PKG_VERSION")),
        };

        let import = ImportConfig {
            total: env_or("IMPORT_TOTAL", "50")?,
            page_size: env_or("IMPORT_PAGE_SIZE", "25")?,
            source_name: env_or("IMPORT_SOURCE_NAME", "Spoonacular")?,
            start_offset: env_or("IMPORT_START_OFFSET", "0")?,
            page_delay_ms: env_or("IMPORT_PAGE_DELAY_MS", "1000")?,
            record_delay_ms: env_or("IMPORT_RECORD_DELAY_MS", "0")?,
            lang: env_or("IMPORT_LANG", "de")?,
            fetch_ingredient_details: env_or("IMPORT_FETCH_INGREDIENT_DETAILS", "true")?,
            fetch_nutrition_details: env_or("IMPORT_FETCH_NUTRITION_DETAILS", "true")?,
            fetch_price_breakdown: env_or("IMPORT_FETCH_PRICE_BREAKDOWN", "true")?,
            price_top_n: env_or("IMPORT_PRICE_TOP_N", "5")?,
            chunk_max_len: env_or("CHUNK_MAX_LEN", "1000")?,
        };

        let embedding = EmbeddingConfig {
            api_url: env_opt("EMBEDDING_API_URL"),
            api_key: env_opt("EMBEDDING_API_KEY"),
            model: env_or("EMBEDDING_MODEL", "text-embedding-3-small")?,
            dims: env_or("EMBEDDING_DIMS", "1536")?,
            timeout_secs: env_or("EMBEDDING_TIMEOUT_SECS", "30")?,
            max_retries: env_or("EMBEDDING_MAX_RETRIES", "3")?,
            batch_size: env_or("EMBEDDING_BATCH_SIZE", "64")?,
        };

        let retrieval = RetrievalConfig {
            top_k: env_or("RETRIEVAL_TOP_K", "5")?,
            max_top_k: env_or("RETRIEVAL_MAX_TOP_K", "50")?,
            hybrid_alpha: env_or("RETRIEVAL_HYBRID_ALPHA", "0.7")?,
            min_vector_score: env_or("RETRIEVAL_MIN_VECTOR_SCORE", "0.5")?,
            keyword_scope: env_or("RETRIEVAL_KEYWORD_SCOPE", "query")?,
            remove_stop_words: env_or("KEYWORDS_REMOVE_STOP_WORDS", "false")?,
        };

        Ok(Settings {
            database,
            server,
            spoonacular,
            import,
            embedding,
            retrieval,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        url::Url::parse(&self.spoonacular.base_url)
            .map_err(|e| Error::Config(format!("Invalid SPOONACULAR_BASE_URL: {e}")))?;

        if let Some(api_url) = &self.embedding.api_url {
            url::Url::parse(api_url)
                .map_err(|e| Error::Config(format!("Invalid EMBEDDING_API_URL: {e}")))?;
        }

        if self.spoonacular.requests_per_second == 0 {
            return Err(Error::Config("Rate limit must be non-zero".to_string()));
        }

        // Spoonacular caps `number` at 100 per request
        if self.import.page_size == 0 || self.import.page_size > 100 {
            return Err(Error::Config(
                "Page size must be between 1 and 100".to_string(),
            ));
        }

        if self.import.chunk_max_len == 0 {
            return Err(Error::Config("Chunk length must be non-zero".to_string()));
        }

        if self.embedding.dims == 0 || self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "Embedding dimensions and batch size must be non-zero".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.hybrid_alpha) {
            return Err(Error::Config(
                "Hybrid alpha must be between 0 and 1".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 || self.retrieval.top_k > self.retrieval.max_top_k {
            return Err(Error::Config(
                "RETRIEVAL_TOP_K must be between 1 and RETRIEVAL_MAX_TOP_K".to_string(),
            ));
        }

        Ok(())
    }
}

impl SpoonacularConfig {
    /// The API key is only needed by commands that talk to Spoonacular
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("SPOONACULAR_API_KEY is not set".to_string()))
    }
}

impl EmbeddingConfig {
    pub fn require_api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .ok_or_else(|| Error::Config("EMBEDDING_API_URL is not set".to_string()))
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
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
            base_url: "http://127.0.0.1:1".to_string(),
            search_query: "soup".to_string(),
            sort: "popularity".to_string(),
            requests_per_second: 1000,
            retry_after_secs: 0,
            timeout_secs: 5,
            user_agent: "test".to_string(),
        },
        import: ImportConfig {
            total: 10,
            page_size: 10,
            source_name: "TestSource".to_string(),
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
            batch_size: 16,
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
