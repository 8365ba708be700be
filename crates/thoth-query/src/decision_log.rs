//! Append-only scrape-decision log (spec §4.6 step 6): one JSON line per
//! article filtering decision, locked the way [`thoth_tracker`]'s ledger
//! locks its document — an `fs2` exclusive lock around the write, never
//! around reads, since appends are the only mutation this log supports.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Download,
    Skip,
    Error,
}

/// One filtering decision for one article (spec §4.6 step 6). `query_scores`
/// holds the quick score computed per query name, independent of whether
/// that query went on to get an LLM evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeDecision {
    pub article_fingerprint: String,
    pub query_scores: HashMap<String, f64>,
    pub decision: Decision,
    pub reasoning: String,
    pub pdf_path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub struct DecisionLog {
    log_path: PathBuf,
}

impl DecisionLog {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self { log_path: log_path.into() }
    }

    /// Logs under the workspace's discovery-results directory, alongside
    /// whatever else the discovery pipeline records there.
    pub fn from_workspace(paths: &thoth_config::WorkspacePaths) -> Self {
        Self::new(paths.discovery_results_dir.join("scrape_decisions.jsonl"))
    }

    /// Appends one decision under an exclusive lock on a sibling `.lock`
    /// file, so concurrent filter runs never interleave partial lines.
    pub fn append(&self, decision: &ScrapeDecision) -> Result<()> {
        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(lock_path(&self.log_path))?;
        lock_file.lock_exclusive().map_err(|_| QueryError::LockFailed)?;

        let mut line = serde_json::to_string(decision)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.log_path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        lock_file.unlock()?;
        Ok(())
    }

    /// Reads every recorded decision in append order. Malformed lines are
    /// skipped with a warning rather than failing the whole read — the log
    /// is advisory history, not a source of truth an operator depends on.
    pub fn read_all(&self) -> Result<Vec<ScrapeDecision>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.log_path)?;
        let mut decisions = Vec::new();
        for line in std::io::BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScrapeDecision>(&line) {
                Ok(decision) => decisions.push(decision),
                Err(err) => tracing::warn!(%err, "skipping malformed decision log line"),
            }
        }
        Ok(decisions)
    }

    /// Decisions recorded for a specific article fingerprint, in append
    /// order — most callers only care about the latest one.
    pub fn for_article(&self, fingerprint: &str) -> Result<Vec<ScrapeDecision>> {
        Ok(self.read_all()?.into_iter().filter(|d| d.article_fingerprint == fingerprint).collect())
    }
}

fn lock_path(log_path: &Path) -> PathBuf {
    log_path.with_extension("lock")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fingerprint: &str, decision: Decision) -> ScrapeDecision {
        ScrapeDecision {
            article_fingerprint: fingerprint.to_string(),
            query_scores: HashMap::from([("ml".to_string(), 0.8)]),
            decision,
            reasoning: "matched query ml".to_string(),
            pdf_path: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn append_then_read_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let log = DecisionLog::new(dir.path().join("decisions.jsonl"));

        log.append(&sample("fp1", Decision::Download)).unwrap();
        log.append(&sample("fp2", Decision::Skip)).unwrap();

        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].article_fingerprint, "fp1");
        assert_eq!(all[1].decision, Decision::Skip);
    }

    #[test]
    fn for_article_filters_by_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let log = DecisionLog::new(dir.path().join("decisions.jsonl"));
        log.append(&sample("fp1", Decision::Download)).unwrap();
        log.append(&sample("fp1", Decision::Error)).unwrap();
        log.append(&sample("fp2", Decision::Skip)).unwrap();

        let history = log.for_article("fp1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].decision, Decision::Error);
    }

    #[test]
    fn read_all_on_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = DecisionLog::new(dir.path().join("missing.jsonl"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn malformed_line_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let log = DecisionLog::new(&path);
        log.append(&sample("fp1", Decision::Download)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"not valid json\n").unwrap();

        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 1);
    }
}
