use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bytes hashed from the start of a file for the ledger fingerprint.
/// Hashing the whole file would defeat the point of a cheap re-check for
/// large PDFs; the first slice plus file size is enough to detect
/// silent modification in practice.
const FINGERPRINT_PREFIX_BYTES: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to acquire ledger lock")]
    LockFailed,
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// A single tracked file's recorded fingerprint (spec §3.1 ProcessedFile).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub absolute_path: String,
    pub size: u64,
    pub sha256_prefix: String,
    pub processed_at: chrono::DateTime<chrono::Utc>,
    pub note_path: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    #[serde(flatten)]
    entries: HashMap<String, ProcessedFile>,
}

/// The content-hash ledger of processed files.
///
/// All writes go through [`Tracker::mark_processed`], which serializes
/// concurrent writers on an `fs2` exclusive lock and writes via
/// temp-file-then-rename so a crash mid-write never leaves a partially
/// written ledger on disk.
pub struct Tracker {
    ledger_path: PathBuf,
}

impl Tracker {
    pub fn new(ledger_path: impl Into<PathBuf>) -> Self {
        Self { ledger_path: ledger_path.into() }
    }

    /// Returns true iff `path` is registered and either its current
    /// fingerprint matches the recorded one, or the file is missing from
    /// disk (spec §4.1: "registered-but-gone" counts as processed so the
    /// watcher doesn't loop on a deleted file; see [`Self::requeue_missing`]
    /// for the rebuild path).
    pub fn is_processed(&self, path: &Path) -> Result<bool> {
        let doc = self.load()?;
        let key = path_key(path);
        let Some(entry) = doc.entries.get(&key) else {
            return Ok(false);
        };

        if !path.exists() {
            return Ok(true);
        }

        let fingerprint = fingerprint_of(path)?;
        Ok(fingerprint.0 == entry.size && fingerprint.1 == entry.sha256_prefix)
    }

    /// Cheap re-check before reprocessing: same comparison as
    /// `is_processed`, but returns false (not true) for a missing entry
    /// or a missing file — callers use this right before skipping
    /// redundant work, not to decide whether to enqueue at all.
    pub fn verify_file_unchanged(&self, path: &Path) -> Result<bool> {
        let doc = self.load()?;
        let key = path_key(path);
        let Some(entry) = doc.entries.get(&key) else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        let fingerprint = fingerprint_of(path)?;
        Ok(fingerprint.0 == entry.size && fingerprint.1 == entry.sha256_prefix)
    }

    /// Registers a file as processed, recomputing its fingerprint from
    /// disk. Serialized under an exclusive lock on the ledger file so
    /// concurrent pipeline workers never interleave writes.
    pub fn mark_processed(&self, path: &Path, note_path: Option<String>) -> Result<()> {
        let (size, sha256_prefix) = fingerprint_of(path)?;
        let entry = ProcessedFile {
            absolute_path: path_key(path),
            size,
            sha256_prefix,
            processed_at: chrono::Utc::now(),
            note_path,
        };

        self.with_lock(|doc| {
            doc.entries.insert(entry.absolute_path.clone(), entry.clone());
            Ok(())
        })
    }

    /// Removes ledger entries whose file no longer exists on disk, so a
    /// subsequent watch pass re-enqueues them. The operator-triggered
    /// "rebuild command" spec §4.1 refers to.
    pub fn requeue_missing(&self) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        self.with_lock(|doc| {
            let gone: Vec<String> = doc
                .entries
                .iter()
                .filter(|(k, _)| !Path::new(k).exists())
                .map(|(k, _)| k.clone())
                .collect();
            for key in &gone {
                doc.entries.remove(key);
            }
            removed = gone;
            Ok(())
        })?;
        Ok(removed)
    }

    pub fn lookup(&self, path: &Path) -> Result<Option<ProcessedFile>> {
        let doc = self.load()?;
        Ok(doc.entries.get(&path_key(path)).cloned())
    }

    /// Loads the ledger, quarantining and restarting from empty if the
    /// document is malformed (spec §4.1: never crash on a bad ledger).
    fn load(&self) -> Result<LedgerDocument> {
        if !self.ledger_path.exists() {
            return Ok(LedgerDocument::default());
        }

        let mut raw = String::new();
        File::open(&self.ledger_path)?.read_to_string(&mut raw)?;

        match serde_json::from_str::<LedgerDocument>(&raw) {
            Ok(doc) => Ok(doc),
            Err(err) => {
                self.quarantine(&raw)?;
                tracing::warn!(path = %self.ledger_path.display(), error = %err, "malformed tracker ledger, quarantined and starting fresh");
                Ok(LedgerDocument::default())
            }
        }
    }

    fn quarantine(&self, raw: &str) -> Result<()> {
        let ts = chrono::Utc::now().timestamp();
        let quarantine_path = self.ledger_path.with_extension(format!("corrupt.{ts}"));
        fs::write(&quarantine_path, raw)?;
        Ok(())
    }

    /// Runs `f` against a freshly loaded document under an exclusive file
    /// lock, then persists the result via temp-file-then-rename.
    fn with_lock(&self, f: impl FnOnce(&mut LedgerDocument) -> Result<()>) -> Result<()> {
        if let Some(parent) = self.ledger_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(lock_path(&self.ledger_path))?;
        lock_file.lock_exclusive().map_err(|_| TrackerError::LockFailed)?;

        let mut doc = self.load()?;
        f(&mut doc)?;
        self.persist(&doc)?;

        lock_file.unlock()?;
        Ok(())
    }

    fn persist(&self, doc: &LedgerDocument) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(doc)?;
        let tmp_path = self.ledger_path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&serialized)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.ledger_path)?;
        Ok(())
    }
}

fn lock_path(ledger_path: &Path) -> PathBuf {
    ledger_path.with_extension("lock")
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// `(size, hex sha256 of the first FINGERPRINT_PREFIX_BYTES)`.
fn fingerprint_of(path: &Path) -> Result<(u64, String)> {
    let metadata = fs::metadata(path)?;
    let size = metadata.len();

    let mut file = File::open(path)?;
    let mut buf = vec![0u8; FINGERPRINT_PREFIX_BYTES.min(size) as usize];
    file.read_exact(&mut buf)?;

    let mut hasher = Sha256::new();
    hasher.update(&buf);
    let digest = hasher.finalize();
    Ok((size, hex::encode(digest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn unprocessed_file_is_not_processed() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::new(dir.path().join("ledger.json"));
        let file = write_temp_file(&dir, "a.pdf", b"hello");
        assert!(!tracker.is_processed(&file).unwrap());
    }

    #[test]
    fn marked_file_is_processed_until_modified() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::new(dir.path().join("ledger.json"));
        let file = write_temp_file(&dir, "a.pdf", b"hello");

        tracker.mark_processed(&file, None).unwrap();
        assert!(tracker.is_processed(&file).unwrap());

        write_temp_file(&dir, "a.pdf", b"modified content");
        assert!(!tracker.is_processed(&file).unwrap());
    }

    #[test]
    fn missing_file_counts_as_processed_but_not_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::new(dir.path().join("ledger.json"));
        let file = write_temp_file(&dir, "a.pdf", b"hello");
        tracker.mark_processed(&file, None).unwrap();

        fs::remove_file(&file).unwrap();
        assert!(tracker.is_processed(&file).unwrap());
        assert!(!tracker.verify_file_unchanged(&file).unwrap());
    }

    #[test]
    fn requeue_missing_drops_gone_entries() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::new(dir.path().join("ledger.json"));
        let file = write_temp_file(&dir, "a.pdf", b"hello");
        tracker.mark_processed(&file, None).unwrap();
        fs::remove_file(&file).unwrap();

        let removed = tracker.requeue_missing().unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!tracker.is_processed(&file).unwrap());
    }

    #[test]
    fn malformed_ledger_is_quarantined_and_restarted() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        fs::write(&ledger_path, "not valid json {{{").unwrap();

        let tracker = Tracker::new(ledger_path.clone());
        let file = write_temp_file(&dir, "a.pdf", b"hello");
        assert!(!tracker.is_processed(&file).unwrap());

        let quarantined: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("corrupt"))
            .collect();
        assert_eq!(quarantined.len(), 1);
    }
}
