pub mod embedding;
pub mod keywords;
pub mod retriever;
pub mod search;

pub use embedding::{Embedder, HttpEmbedder};
pub use keywords::{KeywordExtractor, KeywordScope};
pub use retriever::{ChatAnswer, HybridRetriever, RetrievedRecipe};
pub use search::{Candidate, SearchService, SqliteSearchService};
