//! `StorageBackend` abstracts over "a string blob with a lock around
//! read-modify-write cycles", so [`crate::queue::MessageQueue`] works
//! the same whether that blob lives in a file (the only backend built
//! in this workspace), a database row, or a remote shared-memory block
//! API (as in the original implementation) — the trait exists so those
//! could be added later without changing `MessageQueue`.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{CoordinationError, Result};

pub trait StorageBackend {
    /// Runs `f` against the current blob contents (empty string if the
    /// blob does not exist yet) under an exclusive lock spanning the
    /// whole read-modify-write cycle, persisting whatever `f` returns.
    fn with_blob(&self, f: impl FnOnce(String) -> Result<String>) -> Result<()>;

    /// Reads the current blob contents without modifying them.
    fn read(&self) -> Result<String>;
}

/// The file-backed `StorageBackend`: an `fs2`-exclusive-locked flat
/// file, written via temp-file-then-rename so a crash mid-write never
/// leaves a partially written queue on disk — the same pattern the
/// file-tracking ledger uses for its own JSON document.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StorageBackend for FileBackend {
    fn with_blob(&self, f: impl FnOnce(String) -> Result<String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(lock_path(&self.path))?;
        lock_file.lock_exclusive().map_err(|_| CoordinationError::LockFailed)?;

        let current = self.read()?;
        let updated = f(current)?;
        self.persist(&updated)?;

        lock_file.unlock()?;
        Ok(())
    }

    fn read(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        let mut raw = String::new();
        File::open(&self.path)?.read_to_string(&mut raw)?;
        Ok(raw)
    }
}

impl FileBackend {
    fn persist(&self, content: &str) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(content.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_empty_string_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("queue.txt"));
        assert_eq!(backend.read().unwrap(), "");
    }

    #[test]
    fn with_blob_persists_the_update() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("queue.txt"));
        backend.with_blob(|current| Ok(format!("{current}hello\n"))).unwrap();
        backend.with_blob(|current| Ok(format!("{current}world\n"))).unwrap();
        assert_eq!(backend.read().unwrap(), "hello\nworld\n");
    }
}
