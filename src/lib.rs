pub mod config;
pub mod db;
pub mod error;

// Text processing
pub mod indexer;
pub mod utils;

// Spoonacular ETL
pub mod importer;
pub mod spoonacular;

// Query path
pub mod retrieval;

// Surfaces
pub mod api;
pub mod cli;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
