//! Stable identifiers used across the citation graph and retrieval index.
//!
//! Articles and chunks are referenced by id everywhere, never by pointer —
//! this is the "arena of articles indexed by stable id" design note (spec §9).

use uuid::Uuid;

pub type ArticleId = Uuid;
pub type CitationId = Uuid;
pub type ChunkId = Uuid;

/// Normalize a title for tertiary-key comparison: lowercase, whitespace
/// collapsed, punctuation stripped, truncated to 120 chars. See spec §4.3.
pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase().chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_punctuation_and_case() {
        let a = normalize_title("Attention, Is All You Need!");
        let b = normalize_title("attention is all you need");
        assert_eq!(a, b);
    }

    #[test]
    fn truncates_to_120_chars() {
        let long = "a ".repeat(200);
        assert!(normalize_title(&long).chars().count() <= 120);
    }
}
