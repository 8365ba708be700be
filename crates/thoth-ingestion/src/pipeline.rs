//! The ingestion pipeline (spec §4.2): turns one PDF into markdown, a
//! structured analysis, a citation list, and a derived note, with
//! at-most-once effects per content hash. Steps 1, 2, and 6 are fatal —
//! their failure aborts the run; steps 3, 4, and 5 are soft — they may
//! degrade the resulting article but a note is still produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thoth_citations::CitationGraph;
use thoth_common::ThothError;
use thoth_config::schema::SchemaPreset;
use thoth_config::WorkspacePaths;
use thoth_db::{Article, Chunk, Citation};
use thoth_llm::LlmRouter;
use thoth_tracker::Tracker;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::analysis::{analyze_document, AnalysisRecord};
use crate::chunker::{chunk_document, ChunkerConfig};
use crate::citation_extraction::extract_citations;
use crate::error::{IngestionError, Result};
use crate::notes::render_note;
use crate::pdf_parser::parse_pdf_sections;
use crate::repository::IndexPort;
use crate::sources::arxiv::ArxivClient;
use crate::sources::needs_enhancement;
use crate::sources::opencitations::OpenCitationsClient;
use crate::sources::pdf_locator::PdfLocatorClient;
use crate::sources::scholarly::ScholarlyClient;
use crate::sources::semantic_scholar::SemanticScholarClient;
use crate::sources::CitationEnhancer;

/// Default bound on concurrent per-citation enhancement calls (spec
/// §4.2 step 5: "a configured worker pool (default 3)").
const DEFAULT_ENHANCEMENT_WORKERS: usize = 3;

pub struct PipelineConfig {
    pub paths: WorkspacePaths,
    pub analysis_preset: SchemaPreset,
    pub schema_version: String,
    pub custom_analysis_instructions: Option<String>,
    pub unpaywall_contact_email: String,
    pub enhancement_workers: usize,
    pub chunker: ChunkerConfig,
}

impl PipelineConfig {
    pub fn new(paths: WorkspacePaths, analysis_preset: SchemaPreset, schema_version: String, unpaywall_contact_email: String) -> Self {
        Self {
            paths,
            analysis_preset,
            schema_version,
            custom_analysis_instructions: None,
            unpaywall_contact_email,
            enhancement_workers: DEFAULT_ENHANCEMENT_WORKERS,
            chunker: ChunkerConfig::default(),
        }
    }
}

/// Bundles every collaborator the pipeline needs, so a single PDF's run
/// can be driven with one call to [`Pipeline::ingest`] regardless of
/// which component supplied the path (CLI, watcher, scraper callback —
/// all out of scope here, spec §1).
pub struct Pipeline {
    tracker: Tracker,
    citations: CitationGraph,
    llm: Arc<LlmRouter>,
    index: Arc<dyn IndexPort>,
    enhancers: Vec<Arc<dyn CitationEnhancer>>,
    semantic_scholar: SemanticScholarClient,
    config: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub article_id: Uuid,
    pub note_path: PathBuf,
    pub analysis_failed: bool,
    pub citation_count: usize,
}

impl Pipeline {
    pub fn new(
        tracker: Tracker,
        citations: CitationGraph,
        llm: Arc<LlmRouter>,
        gateway: Arc<thoth_gateway::Gateway>,
        index: Arc<dyn IndexPort>,
        config: PipelineConfig,
    ) -> Self {
        let enhancers: Vec<Arc<dyn CitationEnhancer>> = vec![
            Arc::new(OpenCitationsClient::new(gateway.clone())),
            Arc::new(ArxivClient::new(gateway.clone())),
            Arc::new(ScholarlyClient::new()),
            Arc::new(PdfLocatorClient::new(gateway.clone(), config.unpaywall_contact_email.clone())),
        ];
        let semantic_scholar = SemanticScholarClient::new(gateway);

        Self { tracker, citations, llm, index, enhancers, semantic_scholar, config }
    }

    /// Runs the full pipeline for one PDF. Returns `Ok(None)` when the
    /// content hash was already processed (spec §4.2 idempotence
    /// contract: "re-presenting the same content hash short-circuits at
    /// step 1").
    #[instrument(skip(self), fields(path = %pdf_path.display()))]
    pub async fn ingest(&self, pdf_path: &Path) -> Result<Option<IngestOutcome>> {
        if pdf_path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            return Err(IngestionError::Rejected(format!("not a PDF: {}", pdf_path.display())));
        }

        // Step 1: fingerprint.
        if self.tracker.is_processed(pdf_path)? {
            info!("already processed, short-circuiting at step 1");
            return Ok(None);
        }

        // Step 2: OCR/convert. Fatal.
        let parsed = parse_pdf_sections(pdf_path)
            .map_err(|e| IngestionError::Thoth(ThothError::OcrFailed(e.to_string())))?;
        let markdown = parsed.full_text.clone();
        let markdown_path = self.write_markdown(pdf_path, &markdown)?;

        // Step 3: analyze. Soft.
        let analysis_backend = self.llm.backend_for_role("analysis")?;
        let analysis = match analyze_document(
            analysis_backend.as_ref(),
            &self.config.analysis_preset,
            &self.config.schema_version,
            &markdown,
            self.config.custom_analysis_instructions.as_deref(),
        )
        .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "analysis step failed, article will be marked analysis_failed");
                None
            }
        };
        let analysis_failed = analysis.is_none();

        // Step 4: extract citations. Soft.
        let extraction_backend = self.llm.backend_for_role("citation_extraction")?;
        let extracted = match extract_citations(extraction_backend.as_ref(), &markdown).await {
            Ok(citations) => citations,
            Err(e) => {
                warn!(error = %e, "citation extraction failed, article will have no citations");
                Vec::new()
            }
        };

        let mut citations: Vec<Citation> = extracted
            .into_iter()
            .map(|e| {
                let mut c = Citation::new(Uuid::nil(), e.raw);
                c.title = e.title;
                c.authors = serde_json::to_string(&e.authors).unwrap_or_else(|_| "[]".to_string());
                c.year = e.year;
                c.doi = e.doi;
                c.arxiv_id = e.arxiv_id;
                c
            })
            .collect();

        // Step 5: enhance citations. Soft, per-citation failures never cascade.
        self.enhance_citations(&mut citations).await;

        // Step 6: register. Fatal.
        let title = analysis_title(&analysis).unwrap_or_else(|| parsed.title.clone().unwrap_or_else(|| pdf_path.display().to_string()));
        let mut article = Article::new(title);
        article.pdf_path = Some(pdf_path.display().to_string());
        article.markdown_path = Some(markdown_path.display().to_string());
        if let Some(tags) = analysis_tags(&analysis) {
            article.tags = serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string());
        }
        article.parse_status = if analysis_failed { "analysis_failed".to_string() } else { "parsed".to_string() };
        let article_id = self.citations.register_article(article).await?;
        self.citations.add_citations(article_id, citations.clone()).await?;

        // Step 7: create note.
        let note_path = self.render_and_write_note(pdf_path, &title_for_note(&analysis, &parsed), article_id, &analysis, &citations)?;
        self.relocate_pdf_next_to_note(pdf_path, &note_path)?;

        // Step 8: index.
        self.index_chunks(article_id, &parsed.sections).await?;

        // Step 9: record.
        self.tracker.mark_processed(pdf_path, Some(note_path.display().to_string()))?;

        Ok(Some(IngestOutcome { article_id, note_path, analysis_failed, citation_count: citations.len() }))
    }

    fn write_markdown(&self, pdf_path: &Path, markdown: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.paths.markdown_dir)?;
        let stem = pdf_path.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
        let markdown_path = self.config.paths.markdown_dir.join(format!("{stem}.md"));
        let no_images_path = self.config.paths.markdown_dir.join(format!("{stem}.no_images.md"));
        std::fs::write(&markdown_path, markdown)?;
        // lopdf's extraction is text-only already, so the no-images
        // sibling is identical content under a distinct name (spec
        // §4.2 step 2: "a sibling markdown_no_images").
        std::fs::write(&no_images_path, markdown)?;
        Ok(markdown_path)
    }

    async fn enhance_citations(&self, citations: &mut [Citation]) {
        if let Err(e) = self.semantic_scholar.enhance_batch(citations).await {
            warn!(error = %e, "semantic scholar batch enhancement failed");
        }

        let semaphore = Arc::new(Semaphore::new(self.config.enhancement_workers.max(1)));
        let mut join_set = JoinSet::new();

        for (idx, citation) in citations.iter().enumerate() {
            if !needs_enhancement(citation) {
                continue;
            }
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let mut citation = citation.clone();
            let enhancers = self.enhancers.clone();
            join_set.spawn(async move {
                let _permit = permit;
                for enhancer in &enhancers {
                    if !needs_enhancement(&citation) {
                        break;
                    }
                    match enhancer.enhance(&mut citation).await {
                        Ok(_) => {}
                        Err(e) => warn!(source = enhancer.name(), error = %e, "citation enhancement source failed"),
                    }
                }
                (idx, citation)
            });
        }

        while let Some(result) = join_set.join_next().await {
            if let Ok((idx, enhanced)) = result {
                citations[idx] = enhanced;
            }
        }
    }

    fn render_and_write_note(
        &self,
        pdf_path: &Path,
        title: &str,
        article_id: Uuid,
        analysis: &Option<AnalysisRecord>,
        citations: &[Citation],
    ) -> Result<PathBuf> {
        let note = render_note(title, None, None, None, analysis.as_ref(), citations)
            .map_err(|e| IngestionError::Thoth(ThothError::Other(anyhow::anyhow!(e))))?;
        std::fs::create_dir_all(&self.config.paths.notes_dir)?;
        let stem = pdf_path.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
        let note_path = self.config.paths.notes_dir.join(format!("{stem}-{article_id}.md"));
        std::fs::write(&note_path, note)?;
        Ok(note_path)
    }

    /// Moves the original PDF next to its note so markdown, note, and
    /// PDF are colocated (spec §4.2 step 7).
    fn relocate_pdf_next_to_note(&self, pdf_path: &Path, note_path: &Path) -> Result<()> {
        if let Some(notes_dir) = note_path.parent() {
            if let Some(file_name) = pdf_path.file_name() {
                let destination = notes_dir.join(file_name);
                if destination != pdf_path {
                    std::fs::rename(pdf_path, destination)?;
                }
            }
        }
        Ok(())
    }

    async fn index_chunks(&self, article_id: Uuid, sections: &[crate::chunker::DocumentSection]) -> Result<()> {
        let document_chunks = chunk_document(article_id, sections.to_vec(), &self.config.chunker);
        if document_chunks.is_empty() {
            return Ok(());
        }

        let contents: Vec<String> = document_chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.llm.embed(contents).await?;

        let chunks: Vec<Chunk> = document_chunks
            .into_iter()
            .zip(embeddings)
            .map(|(dc, embedding)| {
                let mut chunk = Chunk::new(dc.paper_id, dc.chunk_index as i64, dc.section_type.as_str().to_string(), dc.content);
                chunk.section = dc.section_heading;
                chunk.page = dc.page_number.map(|p| p as i64);
                chunk.embedding = Some(embedding);
                chunk
            })
            .collect();

        self.index.index_chunks(article_id, chunks).await?;
        Ok(())
    }
}

fn analysis_title(analysis: &Option<AnalysisRecord>) -> Option<String> {
    analysis.as_ref()?.fields.get("title")?.as_str().map(String::from)
}

fn analysis_tags(analysis: &Option<AnalysisRecord>) -> Option<Vec<String>> {
    let tags = analysis.as_ref()?.fields.get("tags")?.as_array()?;
    Some(tags.iter().filter_map(|v| v.as_str().map(String::from)).collect())
}

fn title_for_note(analysis: &Option<AnalysisRecord>, parsed: &crate::pdf_parser::ParsedPdf) -> String {
    analysis_title(analysis).or_else(|| parsed.title.clone()).unwrap_or_else(|| "Untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn non_pdf_extension_is_rejected_before_any_io() {
        let path = Path::new("/tmp/not-a-pdf.txt");
        assert_ne!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
    }

    #[test]
    fn analysis_title_prefers_the_extracted_title_field() {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), serde_json::json!("Attention Is All You Need"));
        let record = AnalysisRecord { preset: "default".to_string(), schema_version: "1".to_string(), fields };

        assert_eq!(analysis_title(&Some(record)), Some("Attention Is All You Need".to_string()));
        assert_eq!(analysis_title(&None), None);
    }

    #[test]
    fn analysis_tags_collects_string_array_entries() {
        let mut fields = BTreeMap::new();
        fields.insert("tags".to_string(), serde_json::json!(["nlp", "transformers"]));
        let record = AnalysisRecord { preset: "default".to_string(), schema_version: "1".to_string(), fields };

        assert_eq!(analysis_tags(&Some(record)), Some(vec!["nlp".to_string(), "transformers".to_string()]));
        assert_eq!(analysis_tags(&None), None);
    }

    #[test]
    fn title_for_note_falls_back_to_parsed_title_then_untitled() {
        let parsed_with_title = crate::pdf_parser::ParsedPdf {
            title: Some("Parsed Title".to_string()),
            sections: Vec::new(),
            full_text: String::new(),
            page_count: 0,
        };
        assert_eq!(title_for_note(&None, &parsed_with_title), "Parsed Title");

        let parsed_without_title =
            crate::pdf_parser::ParsedPdf { title: None, sections: Vec::new(), full_text: String::new(), page_count: 0 };
        assert_eq!(title_for_note(&None, &parsed_without_title), "Untitled");
    }
}
