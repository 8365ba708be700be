//! Pure bibliography formatting from stored `Article` records (spec
//! §4.3 `export_bibliography`). No network or database access here —
//! callers resolve the article ids first via [`crate::CitationGraph`].

use thoth_db::Article;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationStyle {
    Ieee,
    Apa,
    Mla,
    Chicago,
    Harvard,
}

pub fn export_bibliography(articles: &[Article], style: CitationStyle) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, article)| format_entry(i + 1, article, style))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_entry(index: usize, article: &Article, style: CitationStyle) -> String {
    let authors = parse_authors(&article.authors);
    let year = article.year.map(|y| y.to_string()).unwrap_or_else(|| "n.d.".to_string());
    let title = article.title.trim_end_matches('.');

    match style {
        CitationStyle::Ieee => {
            let author_list = if authors.is_empty() { "Anonymous".to_string() } else { authors.join(", ") };
            format!("[{index}] {author_list}, \"{title},\" {year}.")
        }
        CitationStyle::Apa => {
            let author_list = format_authors_surname_first(&authors, ", &");
            format!("{author_list} ({year}). {title}.")
        }
        CitationStyle::Mla => {
            let author_list = if authors.is_empty() { "Anonymous".to_string() } else { authors.join(", ") };
            format!("{author_list}. \"{title}.\" {year}.")
        }
        CitationStyle::Chicago => {
            let author_list = if authors.is_empty() { "Anonymous".to_string() } else { authors.join(", ") };
            format!("{author_list}. \"{title}.\" {year}.")
        }
        CitationStyle::Harvard => {
            let author_list = format_authors_surname_first(&authors, " and");
            format!("{author_list} ({year}) '{title}'.")
        }
    }
}

fn parse_authors(authors_json: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(authors_json).unwrap_or_default()
}

/// Renders "Surname, F." for the first N-1 authors with `joiner` before
/// the last (APA/Harvard convention); falls back to "Anonymous" if empty.
fn format_authors_surname_first(authors: &[String], joiner: &str) -> String {
    if authors.is_empty() {
        return "Anonymous".to_string();
    }
    let formatted: Vec<String> = authors.iter().map(|a| surname_first(a)).collect();
    match formatted.len() {
        1 => formatted[0].clone(),
        _ => {
            let (last, rest) = formatted.split_last().unwrap();
            format!("{}{} {}", rest.join(", "), joiner, last)
        }
    }
}

fn surname_first(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [single] => single.to_string(),
        [given @ .., surname] => {
            let initials: String = given.iter().filter_map(|g| g.chars().next()).map(|c| format!("{c}.")).collect::<Vec<_>>().join(" ");
            format!("{surname}, {initials}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        let mut a = Article::new("Attention Is All You Need".to_string());
        a.authors = serde_json::to_string(&vec!["Ashish Vaswani", "Noam Shazeer"]).unwrap();
        a.year = Some(2017);
        a
    }

    #[test]
    fn ieee_numbers_entries_and_quotes_title() {
        let out = export_bibliography(&[sample_article()], CitationStyle::Ieee);
        assert!(out.starts_with("[1]"));
        assert!(out.contains("\"Attention Is All You Need,\""));
    }

    #[test]
    fn apa_uses_surname_first_with_ampersand() {
        let out = export_bibliography(&[sample_article()], CitationStyle::Apa);
        assert!(out.contains("Vaswani, A."));
        assert!(out.contains("& Shazeer, N."));
        assert!(out.contains("(2017)"));
    }

    #[test]
    fn anonymous_author_fallback_when_authors_empty() {
        let mut a = sample_article();
        a.authors = "[]".to_string();
        let out = export_bibliography(&[a], CitationStyle::Mla);
        assert!(out.starts_with("Anonymous."));
    }
}
