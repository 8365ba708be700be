//! lopdf-based PDF text extraction with heuristic section detection
//! (spec §4.2 step 2: OCR/convert). Produces the `markdown` artifact the
//! rest of the pipeline chunks, analyzes, and extracts citations from.

use anyhow::Result;
use std::path::Path;
use uuid::Uuid;

use crate::chunker::{chunk_document, ChunkerConfig, DocumentSection};
use crate::models::SectionType;

/// Parses a PDF file and extracts structured sections.
pub fn parse_pdf_sections(pdf_path: &Path) -> Result<ParsedPdf> {
    use lopdf::Document as PdfDoc;

    let pdf = PdfDoc::load(pdf_path)?;

    let mut full_text = String::new();
    let mut pages: Vec<(u32, String)> = Vec::new();

    for (page_num, page) in pdf.get_pages() {
        let mut page_text = String::new();
        if let Ok(content) = pdf.get_page_content(page) {
            for obj in content.objects.values() {
                if let lopdf::Object::String(bytes, _) = obj {
                    if let Ok(text) = String::from_utf8(bytes.clone()) {
                        page_text.push_str(&text);
                        page_text.push(' ');
                    }
                }
            }
        }
        pages.push((page_num, page_text.clone()));
        full_text.push_str(&page_text);
        full_text.push('\n');
    }

    let sections = detect_sections(&full_text, &pages);

    Ok(ParsedPdf { title: extract_title(&full_text), sections, full_text, page_count: pages.len() })
}

/// Detects sections using keyword heuristics over the common academic
/// section headings (Abstract/Introduction/Methods/Results/Discussion/
/// Conclusion/References).
fn detect_sections(text: &str, pages: &[(u32, String)]) -> Vec<DocumentSection> {
    let section_markers = [
        ("Abstract", SectionType::Abstract),
        ("Introduction", SectionType::Introduction),
        ("Materials and Methods", SectionType::Methods),
        ("Methods", SectionType::Methods),
        ("Results", SectionType::Results),
        ("Discussion", SectionType::Discussion),
        ("Conclusion", SectionType::Conclusion),
        ("References", SectionType::References),
    ];

    let mut sections = Vec::new();
    let lower_text = text.to_lowercase();

    for (marker, stype) in section_markers {
        if let Some(pos) = lower_text.find(&marker.to_lowercase()) {
            let start = pos;
            let end = find_next_section(&lower_text, pos + marker.len());
            let section_text = text[start..end].to_string();

            sections.push(DocumentSection {
                section_type: stype,
                heading: Some(marker.to_string()),
                text: section_text,
                page_number: find_page_number(pages, pos),
            });
        }
    }

    sections
}

fn find_next_section(text: &str, after: usize) -> usize {
    let remaining = &text[after..];
    let markers = ["\nintroduction", "\nmethods", "\nresults", "\ndiscussion", "\nconclusion", "\nreferences"];

    let mut earliest = text.len();
    for marker in markers {
        if let Some(pos) = remaining.find(marker) {
            earliest = earliest.min(after + pos);
        }
    }
    earliest
}

fn find_page_number(pages: &[(u32, String)], char_pos: usize) -> Option<u32> {
    let mut count = 0;
    for (page_num, page_text) in pages {
        count += page_text.len();
        if count > char_pos {
            return Some(*page_num);
        }
    }
    None
}

fn extract_title(text: &str) -> Option<String> {
    text.lines().find(|l| l.trim().len() > 10).map(|s| s.trim().to_string())
}

/// Parses a PDF and chunks it directly, skipping the intermediate
/// `ParsedPdf` for callers that only need chunks.
pub fn parse_pdf_to_chunks(
    pdf_path: &Path,
    paper_id: Uuid,
    config: Option<ChunkerConfig>,
) -> Result<Vec<crate::models::DocumentChunk>> {
    let parsed = parse_pdf_sections(pdf_path)?;
    let config = config.unwrap_or_default();
    Ok(chunk_document(paper_id, parsed.sections, &config))
}

/// A parsed PDF document.
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    pub title: Option<String>,
    pub sections: Vec<DocumentSection>,
    pub full_text: String,
    pub page_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_academic_sections() {
        let text = "Introduction\nThis paper studies retrieval.\nMethods\nWe used BM25.\nResults\nWe found improvements.";
        let pages = vec![(1, text.to_string())];
        let sections = detect_sections(text, &pages);
        assert!(sections.iter().any(|s| s.section_type == SectionType::Introduction));
        assert!(sections.iter().any(|s| s.section_type == SectionType::Methods));
    }
}
