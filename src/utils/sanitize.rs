// Sanitization utilities

/// Sanitize HTML content using ammonia library for comprehensive XSS protection
pub fn sanitize_html(text: &str) -> String {
    ammonia::clean(text)
}

/// Truncate text to a maximum number of characters
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
