//! Directory layout for a Thoth workspace. Mirrors the original Python
//! `CoreConfig`'s directory fields (`src/thoth/config/simplified.py`) —
//! one base `workspace_dir` with everything else resolved relative to it
//! unless overridden.

use std::path::{Path, PathBuf};

/// Absolute paths for every directory the pipeline, query store, and
/// coordination substrate read or write.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WorkspacePaths {
    pub workspace_dir: PathBuf,
    pub pdf_dir: PathBuf,
    pub markdown_dir: PathBuf,
    pub notes_dir: PathBuf,
    pub prompts_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub output_dir: PathBuf,
    pub knowledge_base_dir: PathBuf,
    pub graph_storage_path: PathBuf,
    pub queries_dir: PathBuf,
    pub agent_storage_dir: PathBuf,
    pub discovery_sources_dir: PathBuf,
    pub discovery_results_dir: PathBuf,
}

impl Default for WorkspacePaths {
    fn default() -> Self {
        Self::rooted_at(Path::new("./workspace"))
    }
}

impl WorkspacePaths {
    /// Derives the full layout from a single workspace root, following the
    /// original's convention of subdirectories under one base dir.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            workspace_dir: root.to_path_buf(),
            pdf_dir: root.join("pdfs"),
            markdown_dir: root.join("markdown"),
            notes_dir: root.join("notes"),
            prompts_dir: root.join("prompts"),
            templates_dir: root.join("templates"),
            output_dir: root.join("output"),
            knowledge_base_dir: root.join("knowledge"),
            graph_storage_path: root.join("knowledge/graph"),
            queries_dir: root.join("queries"),
            agent_storage_dir: root.join("agent"),
            discovery_sources_dir: root.join("discovery/sources"),
            discovery_results_dir: root.join("discovery/results"),
        }
    }

    /// Creates every directory in the layout, if missing.
    pub fn ensure_exist(&self) -> std::io::Result<()> {
        for dir in [
            &self.workspace_dir,
            &self.pdf_dir,
            &self.markdown_dir,
            &self.notes_dir,
            &self.prompts_dir,
            &self.templates_dir,
            &self.output_dir,
            &self.knowledge_base_dir,
            &self.queries_dir,
            &self.agent_storage_dir,
            &self.discovery_sources_dir,
            &self.discovery_results_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = self.graph_storage_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_subdirectories_from_root() {
        let paths = WorkspacePaths::rooted_at(Path::new("/tmp/thoth-ws"));
        assert_eq!(paths.pdf_dir, Path::new("/tmp/thoth-ws/pdfs"));
        assert_eq!(paths.queries_dir, Path::new("/tmp/thoth-ws/queries"));
    }
}
