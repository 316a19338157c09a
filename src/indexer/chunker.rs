use crate::db::models::NewPriceBreakdown;
use crate::utils::text::word_count;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default upper bound for an instructions chunk, in characters
pub const DEFAULT_MAX_LEN: usize = 1000;

const BULLET: &str = "- ";

/// Section of the recipe a chunk was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ChunkType {
    Title,
    Ingredients,
    Instructions,
    Price,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Title => "title",
            ChunkType::Ingredients => "ingredients",
            ChunkType::Instructions => "instructions",
            ChunkType::Price => "price",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(ChunkType::Title),
            "ingredients" => Ok(ChunkType::Ingredients),
            "instructions" => Ok(ChunkType::Instructions),
            "price" => Ok(ChunkType::Price),
            other => Err(format!("unknown chunk type: {other}")),
        }
    }
}

/// A retrieval unit cut from a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_type: ChunkType,
    pub content: String,
    /// Whitespace word count, not a model tokenizer count
    pub token_count: usize,
}

impl Chunk {
    pub fn new(chunk_type: ChunkType, content: String) -> Self {
        let token_count = word_count(&content);
        Self {
            chunk_type,
            content,
            token_count,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    pub max_len: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl Chunker {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    /// Cut a recipe into title, ingredients and instruction chunks, in that order
    pub fn chunk<S: AsRef<str>>(
        &self,
        title: &str,
        ingredient_lines: &[S],
        instructions_plain: &str,
    ) -> Vec<Chunk> {
        let mut chunks = vec![
            Chunk::new(ChunkType::Title, title.to_string()),
            Chunk::new(ChunkType::Ingredients, ingredients_block(ingredient_lines)),
        ];

        chunks.extend(
            self.split_instructions(instructions_plain)
                .into_iter()
                .map(|part| Chunk::new(ChunkType::Instructions, part)),
        );

        chunks
    }

    /// Greedily pack non-blank paragraphs into chunks of at most `max_len`
    /// characters. A paragraph longer than `max_len` becomes its own chunk.
    pub fn split_instructions(&self, instructions: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for paragraph in instructions
            .split('\n')
            .map(|p| p.trim_matches(|c: char| c == '\r' || c.is_whitespace()))
            .filter(|p| !p.is_empty())
        {
            let len = paragraph.chars().count();

            if current.is_empty() {
                current.push_str(paragraph);
                current_len = len;
            } else if current_len + 1 + len > self.max_len {
                chunks.push(std::mem::take(&mut current));
                current.push_str(paragraph);
                current_len = len;
            } else {
                current.push('\n');
                current.push_str(paragraph);
                current_len += 1 + len;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

/// Chunk with the default maximum instruction length
pub fn chunk<S: AsRef<str>>(
    title: &str,
    ingredient_lines: &[S],
    instructions_plain: &str,
) -> Vec<Chunk> {
    Chunker::default().chunk(title, ingredient_lines, instructions_plain)
}

/// Bullet list of the non-blank ingredient lines
pub fn ingredients_block<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .map(|line| format!("{BULLET}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cost summary listing the `top_n` costliest line items.
/// Returns `None` when the breakdown carries no cost data.
pub fn price_chunk(breakdown: &NewPriceBreakdown, top_n: usize) -> Option<Chunk> {
    if breakdown.total_cost <= 0 && breakdown.items.is_empty() {
        return None;
    }

    let mut items: Vec<_> = breakdown.items.iter().collect();
    items.sort_by(|a, b| b.cost.cmp(&a.cost).then_with(|| a.name.cmp(&b.name)));

    let mut lines = vec![format!(
        "Estimated cost: {} total, {} per serving",
        format_minor_units(breakdown.total_cost),
        format_minor_units(breakdown.cost_per_serving)
    )];

    if top_n > 0 && !items.is_empty() {
        lines.push("Most expensive ingredients:".to_string());
        lines.extend(
            items
                .into_iter()
                .take(top_n)
                .map(|item| format!("{BULLET}{}: {}", item.name, format_minor_units(item.cost))),
        );
    }

    Some(Chunk::new(ChunkType::Price, lines.join("\n")))
}

/// Render cents as a dollar amount (Spoonacular prices are US cents)
pub fn format_minor_units(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewPriceItem;

    #[test]
    fn test_chunk_order_and_types() {
        let chunks = chunk("Tomato Soup", &["3 tomatoes", "1 tsp salt"], "Chop.\nBoil.\nServe.");

        let types: Vec<_> = chunks.iter().map(|c| c.chunk_type).collect();
        assert_eq!(
            types,
            vec![ChunkType::Title, ChunkType::Ingredients, ChunkType::Instructions]
        );
        assert_eq!(chunks[0].content, "Tomato Soup");
        assert_eq!(chunks[0].token_count, 2);
        assert_eq!(chunks[1].content, "- 3 tomatoes\n- 1 tsp salt");
        assert_eq!(chunks[2].content, "Chop.\nBoil.\nServe.");
        assert_eq!(chunks[2].token_count, 3);
    }

    #[test]
    fn test_ingredients_block_drops_blank_lines() {
        assert_eq!(ingredients_block(&["salt", "  ", "", " pepper "]), "- salt\n- pepper");

        let empty: [&str; 0] = [];
        let chunks = chunk("Water", &empty, "");
        assert_eq!(chunks[1].chunk_type, ChunkType::Ingredients);
        assert!(!chunks[1].content.contains(BULLET));
        assert_eq!(chunks[1].token_count, 0);
    }

    #[test]
    fn test_instructions_split_respects_max_len() {
        let chunker = Chunker::new(50);
        let paragraph = "x".repeat(30);
        let text = format!("{paragraph}\n{paragraph}\n{paragraph}");

        let parts = chunker.split_instructions(&text);
        assert!(parts.len() >= 2);
        for part in &parts {
            assert!(part.chars().count() <= 50, "chunk too long: {}", part.len());
        }
        assert_eq!(parts.join("\n"), text);
    }

    #[test]
    fn test_packs_small_paragraphs_together() {
        let chunker = Chunker::new(11);
        // "aaaa\nbbbb" is 9 chars, adding "\ncccc" would make 14
        let parts = chunker.split_instructions("aaaa\nbbbb\ncccc");
        assert_eq!(parts, vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_long_paragraph_is_not_split() {
        let chunker = Chunker::new(10);
        let long = "y".repeat(25);
        let parts = chunker.split_instructions(&format!("short\n{long}\nend"));
        assert_eq!(parts, vec!["short".to_string(), long, "end".to_string()]);
    }

    #[test]
    fn test_empty_instructions_yield_no_chunks() {
        let chunker = Chunker::default();
        assert!(chunker.split_instructions("").is_empty());
        assert!(chunker.split_instructions("  \n\r\n \t").is_empty());

        let chunks = chunk("Water", &["water"], "");
        assert!(chunks.iter().all(|c| c.chunk_type != ChunkType::Instructions));
    }

    #[test]
    fn test_max_len_counts_characters() {
        let chunker = Chunker::new(5);
        // Two 2-char paragraphs with multibyte letters fit in 5 chars
        let parts = chunker.split_instructions("äö\nüß");
        assert_eq!(parts, vec!["äö\nüß".to_string()]);
    }

    #[test]
    fn test_price_chunk_lists_costliest_first() {
        let breakdown = NewPriceBreakdown {
            total_cost: 345,
            cost_per_serving: 86,
            items: vec![
                NewPriceItem {
                    name: "salt".to_string(),
                    amount: Some(1.0),
                    unit: Some("tsp".to_string()),
                    cost: 2,
                },
                NewPriceItem {
                    name: "beef".to_string(),
                    amount: Some(500.0),
                    unit: Some("g".to_string()),
                    cost: 250,
                },
                NewPriceItem {
                    name: "onion".to_string(),
                    amount: Some(1.0),
                    unit: None,
                    cost: 40,
                },
            ],
        };

        let chunk = price_chunk(&breakdown, 2).unwrap();
        assert_eq!(chunk.chunk_type, ChunkType::Price);
        assert_eq!(
            chunk.content,
            "Estimated cost: $3.45 total, $0.86 per serving\n\
             Most expensive ingredients:\n\
             - beef: $2.50\n\
             - onion: $0.40"
        );
    }

    #[test]
    fn test_price_chunk_without_data() {
        let breakdown = NewPriceBreakdown {
            total_cost: 0,
            cost_per_serving: 0,
            items: Vec::new(),
        };
        assert!(price_chunk(&breakdown, 5).is_none());
    }

    #[test]
    fn test_chunk_type_round_trip_names() {
        for ty in [
            ChunkType::Title,
            ChunkType::Ingredients,
            ChunkType::Instructions,
            ChunkType::Price,
        ] {
            assert_eq!(ty.as_str().parse::<ChunkType>().unwrap(), ty);
        }
        assert!("summary".parse::<ChunkType>().is_err());
    }

    #[test]
    fn test_format_minor_units() {
        assert_eq!(format_minor_units(5), "$0.05");
        assert_eq!(format_minor_units(1234), "$12.34");
        assert_eq!(format_minor_units(-150), "-$1.50");
    }
}
