//! Citation graph: the canonical set of articles and their reference
//! relations (spec §4.3). Owns `Article` and `Citation` rows exclusively
//! (spec §3.2) via `thoth-db`'s repositories.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use thoth_common::ids::normalize_title;
use thoth_db::{Article, ArticleRepository, Citation, CitationRepository, Database};
use uuid::Uuid;

use crate::error::Result;

#[derive(Clone)]
pub struct CitationGraph {
    articles: ArticleRepository,
    citations: CitationRepository,
    fan_out_cap: usize,
}

impl CitationGraph {
    pub fn new(db: Arc<Database>) -> Self {
        Self { articles: ArticleRepository::new(db.clone()), citations: CitationRepository::new(db), fan_out_cap: 50 }
    }

    pub fn with_fan_out_cap(mut self, cap: usize) -> Self {
        self.fan_out_cap = cap;
        self
    }

    /// Atomic upsert (spec §4.3): match by exact DOI, then exact arXiv
    /// ID, then normalized-title equality. On a match, scalar fields are
    /// merged (a non-null incoming value overwrites a null existing one;
    /// an incoming non-null value never clobbers an existing non-null
    /// value) and tags are unioned; otherwise the record is inserted.
    pub async fn register_article(&self, mut incoming: Article) -> Result<Uuid> {
        if incoming.normalized_title.is_empty() {
            incoming.normalized_title = normalize_title(&incoming.title);
        }

        let existing = self.find_matching_article(&incoming).await?;

        match existing {
            Some(mut current) => {
                merge_article(&mut current, &incoming);
                self.articles.update(&current).await?;
                Ok(current.id)
            }
            None => {
                self.articles.insert(&incoming).await?;
                Ok(incoming.id)
            }
        }
    }

    async fn find_matching_article(&self, candidate: &Article) -> Result<Option<Article>> {
        if let Some(doi) = candidate.doi.as_deref() {
            if let Some(found) = self.articles.find_by_doi(doi).await? {
                return Ok(Some(found));
            }
        }
        if let Some(arxiv_id) = candidate.arxiv_id.as_deref() {
            if let Some(found) = self.articles.find_by_arxiv_id(arxiv_id).await? {
                return Ok(Some(found));
            }
        }
        Ok(self.articles.find_by_normalized_title(&candidate.normalized_title).await?)
    }

    /// Inserts new citation edges from `source_article_id`, attempting
    /// resolution against existing articles with the same match
    /// precedence as `register_article`. Duplicate `(source, target)`
    /// edges already present are collapsed rather than re-inserted.
    pub async fn add_citations(&self, source_article_id: Uuid, citations: Vec<Citation>) -> Result<()> {
        if citations.is_empty() {
            return Ok(());
        }

        let existing = self.citations.find_by_source(source_article_id).await?;
        let existing_targets: HashSet<Uuid> = existing.iter().filter_map(|c| c.target_article_id).collect();

        let mut to_insert = Vec::with_capacity(citations.len());
        for mut citation in citations {
            citation.source_article_id = source_article_id;

            let resolved = self.resolve_citation_target(&citation).await?;
            if let Some(target_id) = resolved {
                if existing_targets.contains(&target_id) {
                    continue;
                }
                citation.target_article_id = Some(target_id);
            }
            to_insert.push(citation);
        }

        self.citations.insert_batch(&to_insert).await?;
        Ok(())
    }

    async fn resolve_citation_target(&self, citation: &Citation) -> Result<Option<Uuid>> {
        if let Some(doi) = citation.doi.as_deref() {
            if let Some(found) = self.articles.find_by_doi(doi).await? {
                return Ok(Some(found.id));
            }
        }
        if let Some(arxiv_id) = citation.arxiv_id.as_deref() {
            if let Some(found) = self.articles.find_by_arxiv_id(arxiv_id).await? {
                return Ok(Some(found.id));
            }
        }
        if let Some(title) = citation.title.as_deref() {
            let normalized = normalize_title(title);
            if let Some(found) = self.articles.find_by_normalized_title(&normalized).await? {
                return Ok(Some(found.id));
            }
        }
        Ok(None)
    }

    /// Re-resolves a previously-unresolved citation edge (e.g. after a
    /// later ingestion registers the article it was waiting on).
    /// Resolution is monotonic: an already-resolved edge is left alone.
    pub async fn reresolve_pending_citations(&self) -> Result<usize> {
        let unresolved = self.citations.find_unresolved().await?;
        let mut resolved_count = 0;
        for mut citation in unresolved {
            if let Some(target_id) = self.resolve_citation_target(&citation).await? {
                citation.target_article_id = Some(target_id);
                self.citations.resolve(&citation).await?;
                resolved_count += 1;
            }
        }
        Ok(resolved_count)
    }

    /// BFS over the citation graph out to `depth` hops (capped at 2),
    /// bounded at each hop by the configured fan-out cap (spec §4.3).
    pub async fn find_related(&self, article_id: Uuid, depth: usize) -> Result<Vec<Uuid>> {
        let depth = depth.min(2);
        let mut visited: HashSet<Uuid> = HashSet::from([article_id]);
        let mut frontier: VecDeque<(Uuid, usize)> = VecDeque::from([(article_id, 0)]);
        let mut related = Vec::new();

        while let Some((current_id, current_depth)) = frontier.pop_front() {
            if current_depth >= depth {
                continue;
            }

            let mut neighbors: Vec<Uuid> = Vec::new();
            for citation in self.citations.find_by_source(current_id).await? {
                if let Some(target) = citation.target_article_id {
                    neighbors.push(target);
                }
            }
            for citation in self.citations.find_by_target(current_id).await? {
                neighbors.push(citation.source_article_id);
            }
            neighbors.truncate(self.fan_out_cap);

            for neighbor_id in neighbors {
                if visited.insert(neighbor_id) {
                    related.push(neighbor_id);
                    frontier.push_back((neighbor_id, current_depth + 1));
                }
            }
        }

        Ok(related)
    }

    pub async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self.articles.find_by_id(id).await?)
    }
}

/// Non-null incoming scalar fields overwrite null existing ones; tags
/// are unioned (spec §4.3). Existing non-null values are never cleared.
fn merge_article(current: &mut Article, incoming: &Article) {
    if current.doi.is_none() {
        current.doi = incoming.doi.clone();
    }
    if current.arxiv_id.is_none() {
        current.arxiv_id = incoming.arxiv_id.clone();
    }
    if current.abstract_text.is_none() {
        current.abstract_text = incoming.abstract_text.clone();
    }
    if current.year.is_none() {
        current.year = incoming.year;
    }
    if current.pdf_path.is_none() {
        current.pdf_path = incoming.pdf_path.clone();
    }
    if current.markdown_path.is_none() {
        current.markdown_path = incoming.markdown_path.clone();
    }
    if current.note_path.is_none() {
        current.note_path = incoming.note_path.clone();
    }

    current.authors = union_json_string_arrays(&current.authors, &incoming.authors);
    current.tags = union_json_string_arrays(&current.tags, &incoming.tags);
    current.updated_at = chrono::Utc::now();
}

fn union_json_string_arrays(a: &str, b: &str) -> String {
    let mut merged: Vec<String> = serde_json::from_str::<Vec<String>>(a).unwrap_or_default();
    let incoming: Vec<String> = serde_json::from_str::<Vec<String>>(b).unwrap_or_default();
    for item in incoming {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    serde_json::to_string(&merged).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_fills_null_scalar_fields_without_overwriting_existing() {
        let mut current = Article::new("Title".to_string());
        current.doi = Some("10.1/existing".to_string());
        current.year = None;

        let mut incoming = Article::new("Title".to_string());
        incoming.doi = Some("10.1/other".to_string());
        incoming.year = Some(2020);

        merge_article(&mut current, &incoming);

        assert_eq!(current.doi.as_deref(), Some("10.1/existing"));
        assert_eq!(current.year, Some(2020));
    }

    #[test]
    fn merge_unions_tags_without_duplicates() {
        let mut current = Article::new("Title".to_string());
        current.tags = serde_json::to_string(&vec!["a", "b"]).unwrap();
        let mut incoming = Article::new("Title".to_string());
        incoming.tags = serde_json::to_string(&vec!["b", "c"]).unwrap();

        merge_article(&mut current, &incoming);

        let tags: Vec<String> = serde_json::from_str(&current.tags).unwrap();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }
}
