//! Core data models for the question-answering pipeline.
//!
//! These types represent the pages, chunks, and answers that flow through
//! chunking, indexing, retrieval, and answer composition.

use serde::{Deserialize, Serialize};

/// One page of extracted document text, before chunking.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    /// Raw extracted text for the page.
    pub text: String,
    /// 1-based page number.
    pub number: u32,
}

/// An overlapping span of document text with page provenance.
///
/// Chunks are created once during chunking and never mutated. `page` is
/// `None` when the source page is unknown; it renders as `Unknown` in
/// prompt labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub page: Option<u32>,
    /// Position in the document's chunk sequence, contiguous from 0.
    pub chunk_index: usize,
}

/// A chunk paired with its relevance score for a query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// A citation entry in an [`Answer`]: the page the cited chunk came from
/// plus a truncated excerpt of its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub page: Option<u32>,
    pub excerpt: String,
}

/// Generated answer text plus its rank-ordered source citations.
///
/// A `[Source i]` marker in `answer` refers to `sources[i - 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}
