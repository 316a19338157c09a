use crate::db::{recipes, DbPool};
use crate::error::{Error, Result};
use crate::utils::text::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Fixed English and German stop word list
pub const STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "for", "from", "have",
    "how", "i", "in", "is", "it", "me", "my", "of", "on", "or", "please", "some", "that", "the",
    "this", "to", "want", "was", "what", "which", "with", "would", "you",
    // German
    "aber", "auch", "auf", "aus", "bei", "bitte", "das", "dem", "den", "der", "die", "ein",
    "eine", "einen", "einer", "es", "für", "hat", "ich", "im", "in", "ist", "mit", "mir",
    "möchte", "nach", "nicht", "oder", "und", "von", "was", "welche", "wie", "zu",
];

/// Which keyword set the retriever hands to the search service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordScope {
    /// Keywords of the query only
    #[default]
    #[serde(rename = "query")]
    QueryOnly,
    /// Query keywords plus every keyword of the stored corpus
    #[serde(rename = "query+corpus")]
    QueryAndCorpus,
}

impl KeywordScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordScope::QueryOnly => "query",
            KeywordScope::QueryAndCorpus => "query+corpus",
        }
    }
}

impl fmt::Display for KeywordScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeywordScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "query" => Ok(KeywordScope::QueryOnly),
            "query+corpus" => Ok(KeywordScope::QueryAndCorpus),
            other => Err(Error::Config(format!("Unknown keyword scope: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordExtractor {
    pub remove_stop_words: bool,
}

impl KeywordExtractor {
    pub fn new(remove_stop_words: bool) -> Self {
        Self { remove_stop_words }
    }

    /// Normalized, de-duplicated tokens of `text`, sorted
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        normalize(text)
            .split_whitespace()
            .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .filter(|token| !self.remove_stop_words || !STOP_WORDS.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Union of keywords over every stored recipe title and instruction text
    pub async fn corpus_keywords(&self, pool: &DbPool) -> Result<BTreeSet<String>> {
        let mut keywords = BTreeSet::new();

        for (title, instructions) in recipes::list_recipe_texts(pool).await? {
            keywords.extend(self.extract(&title));
            if let Some(instructions) = instructions {
                keywords.extend(self.extract(&instructions));
            }
        }

        Ok(keywords)
    }
}
