// Utility functions
pub mod sanitize;
pub mod text;

pub use text::{html_to_text, normalize, normalize_opt, word_count};
