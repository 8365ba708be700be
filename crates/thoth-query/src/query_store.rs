//! Query store (spec §4.6, §3.2): CRUD over named `ResearchQuery`
//! records, one JSON document per query in a queries directory. Names
//! are the primary key and are filename-sanitized; an explicit update
//! with the same name overwrites its file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchQuery {
    pub name: String,
    pub description: String,
    pub research_question: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub required_topics: Vec<String>,
    #[serde(default)]
    pub preferred_topics: Vec<String>,
    #[serde(default)]
    pub excluded_topics: Vec<String>,
    #[serde(default)]
    pub methodology_preferences: Vec<String>,
    pub minimum_relevance_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchQuery {
    pub fn new(name: impl Into<String>, description: impl Into<String>, research_question: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            research_question: research_question.into(),
            keywords: Vec::new(),
            required_topics: Vec::new(),
            preferred_topics: Vec::new(),
            excluded_topics: Vec::new(),
            methodology_preferences: Vec::new(),
            minimum_relevance_score: 0.7,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sanitizes a query name into a filesystem-safe filename stem: ASCII
/// letters, digits, `-`, and `_` are kept; everything else becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

pub struct QueryStore {
    storage_dir: PathBuf,
}

impl QueryStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self { storage_dir: storage_dir.into() }
    }

    /// Stores queries under the workspace's configured `queries_dir`.
    pub fn from_workspace(paths: &thoth_config::WorkspacePaths) -> Self {
        Self::new(paths.queries_dir.clone())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", sanitize_filename(name)))
    }

    /// Creates a new query or overwrites an existing one with the same
    /// name (spec §4.6: "collisions overwrite on explicit update").
    pub fn save(&self, mut query: ResearchQuery) -> Result<ResearchQuery> {
        if query.name.trim().is_empty() {
            return Err(QueryError::InvalidName(query.name));
        }
        std::fs::create_dir_all(&self.storage_dir)?;

        if self.path_for(&query.name).exists() {
            query.updated_at = Utc::now();
        }

        let raw = serde_json::to_string_pretty(&query)?;
        std::fs::write(self.path_for(&query.name), raw)?;
        Ok(query)
    }

    pub fn get(&self, name: &str) -> Result<Option<ResearchQuery>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn list(&self) -> Result<Vec<String>> {
        if !self.storage_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.storage_dir)? {
            let entry = entry?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads every stored query (spec §4.6 step 1-2: filtering iterates
    /// over all of them).
    pub fn list_all(&self) -> Result<Vec<ResearchQuery>> {
        let mut queries = Vec::new();
        for name in self.list()? {
            if let Some(query) = self.get(&name)? {
                queries.push(query);
            }
        }
        Ok(queries)
    }

    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(sanitize_filename("ml/research: v2"), "ml_research__v2");
    }

    #[test]
    fn save_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueryStore::new(dir.path());
        let query = ResearchQuery::new("ml_research", "desc", "what's new in ML?");

        store.save(query.clone()).unwrap();
        let loaded = store.get("ml_research").unwrap().unwrap();

        assert_eq!(loaded.name, "ml_research");
        assert_eq!(loaded.research_question, "what's new in ML?");
    }

    #[test]
    fn save_twice_overwrites_rather_than_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueryStore::new(dir.path());
        store.save(ResearchQuery::new("q", "d1", "r1")).unwrap();
        store.save(ResearchQuery::new("q", "d2", "r2")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["q".to_string()]);
        assert_eq!(store.get("q").unwrap().unwrap().description, "d2");
    }

    #[test]
    fn list_is_sorted_and_empty_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueryStore::new(dir.path());
        assert!(store.list().unwrap().is_empty());

        store.save(ResearchQuery::new("zebra", "d", "r")).unwrap();
        store.save(ResearchQuery::new("alpha", "d", "r")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["alpha".to_string(), "zebra".to_string()]);
    }
}
