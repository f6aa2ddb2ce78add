//! Pipeline error taxonomy.
//!
//! Every failure mode a request can hit is a distinct kind so the HTTP
//! layer can map it to a status code instead of collapsing everything
//! into a generic 500. All variants are terminal for the request; the
//! caller decides whether to retry.

/// Error returned by the indexing and question-answering pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The document contains no extractable text (e.g. a scanned,
    /// image-only PDF). Surfaced as "no content to index".
    InvalidDocument(String),
    /// The document could not be read or parsed at all.
    UnreadableDocument(String),
    /// No index exists at the requested key.
    IndexNotFound(String),
    /// An index blob exists but cannot be decoded into the expected shape.
    CorruptIndex(String),
    /// The query cannot be transformed into the space the index was built
    /// in (wrong embedding model, wrong dims, or embeddings disabled).
    VectorSpaceMismatch(String),
    /// The generative model call failed or timed out.
    GenerationFailed(String),
    /// Storage or other infrastructure fault.
    Internal(anyhow::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::InvalidDocument(msg) => {
                write!(f, "invalid document: {}", msg)
            }
            PipelineError::UnreadableDocument(msg) => {
                write!(f, "unreadable document: {}", msg)
            }
            PipelineError::IndexNotFound(key) => {
                write!(f, "index not found: {}", key)
            }
            PipelineError::CorruptIndex(msg) => {
                write!(f, "corrupt index: {}", msg)
            }
            PipelineError::VectorSpaceMismatch(msg) => {
                write!(f, "vector space mismatch: {}", msg)
            }
            PipelineError::GenerationFailed(msg) => {
                write!(f, "generation failed: {}", msg)
            }
            PipelineError::Internal(err) => write!(f, "internal error: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Internal(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Internal(err)
    }
}

impl PipelineError {
    /// Machine-readable code for the HTTP error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidDocument(_) => "invalid_document",
            PipelineError::UnreadableDocument(_) => "unreadable_document",
            PipelineError::IndexNotFound(_) => "not_found",
            PipelineError::CorruptIndex(_) => "corrupt_index",
            PipelineError::VectorSpaceMismatch(_) => "vector_space_mismatch",
            PipelineError::GenerationFailed(_) => "generation_failed",
            PipelineError::Internal(_) => "internal",
        }
    }
}
