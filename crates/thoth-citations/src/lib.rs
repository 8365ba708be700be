//! thoth-citations — the citation graph (spec §4.3): canonical articles,
//! their reference relations, deterministic article ids, related-article
//! BFS, and bibliography export.

pub mod bibliography;
pub mod error;
pub mod repository;

pub use bibliography::{export_bibliography, CitationStyle};
pub use error::{CitationGraphError, Result};
pub use repository::CitationGraph;
