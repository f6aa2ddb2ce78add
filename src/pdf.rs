//! Per-page PDF text extraction.
//!
//! Implements the document-ingestion contract: a document identifier in,
//! an ordered sequence of (page text, page number) out. Extraction never
//! panics; an unparseable file is reported as
//! [`PipelineError::UnreadableDocument`] and a text-free one is caught
//! later by the chunker. Page numbers are 1-based.

use std::path::Path;

use crate::error::PipelineError;
use crate::models::DocumentPage;

/// Read a PDF from disk and extract its pages.
pub fn read_pdf_pages(path: &Path) -> Result<Vec<DocumentPage>, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| {
        PipelineError::UnreadableDocument(format!("{}: {}", path.display(), e))
    })?;
    extract_pages(&bytes)
}

/// Extract page texts from in-memory PDF bytes.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<DocumentPage>, PipelineError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PipelineError::UnreadableDocument(format!("PDF extraction failed: {}", e)))?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| DocumentPage {
            text,
            number: i as u32 + 1,
        })
        .collect())
}
