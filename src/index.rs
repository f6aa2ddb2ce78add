//! Index build and serialization.
//!
//! One index per document: the chunk sequence plus whatever fitted
//! representation the configured scoring strategy needs to place a future
//! query in the same space. The index is self-describing — the strategy
//! and its transform parameters travel inside the blob, so loading never
//! depends on the configuration that built it.
//!
//! Serialized as a versioned JSON blob. Callers treat the bytes as
//! opaque; an unexpected version or shape decodes to
//! [`PipelineError::CorruptIndex`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::embedding::Embedder;
use crate::error::PipelineError;
use crate::models::Chunk;
use crate::tfidf::TfidfModel;

/// Bumped whenever the serialized shape changes incompatibly.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// How chunks are scored against a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    /// Set-overlap count of lowercased whitespace tokens. No fitting,
    /// no dependencies.
    Lexical,
    /// TF-IDF vectors with cosine similarity.
    Tfidf,
    /// Dense sentence embeddings with cosine similarity.
    Dense,
}

impl ScoringStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lexical" => Some(Self::Lexical),
            "tfidf" => Some(Self::Tfidf),
            "dense" => Some(Self::Dense),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Tfidf => "tfidf",
            Self::Dense => "dense",
        }
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fitted per-strategy representation stored alongside the chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IndexRepr {
    Lexical {
        /// Sorted, deduplicated token set per chunk, in chunk order.
        token_sets: Vec<Vec<String>>,
    },
    Tfidf {
        model: TfidfModel,
        /// L2-normalized tf-idf vector per chunk, in chunk order.
        vectors: Vec<Vec<f32>>,
    },
    Dense {
        /// Embedding model the vectors came from; queries must use it too.
        model: String,
        dims: usize,
        vectors: Vec<Vec<f32>>,
    },
}

/// Searchable representation of one document.
///
/// Chunk ordering is stable and matches `chunk_index`; every
/// representation's vector `i` belongs to `chunks[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIndex {
    pub version: u32,
    /// Identifier of this build; a rebuild gets a fresh one.
    pub index_id: String,
    pub strategy: ScoringStrategy,
    /// SHA-256 over the chunk texts, for change detection.
    pub content_hash: String,
    pub chunks: Vec<Chunk>,
    pub repr: IndexRepr,
}

impl DocumentIndex {
    /// Serialize into the opaque blob handed to the index store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        serde_json::to_vec(self).map_err(|e| PipelineError::Internal(e.into()))
    }

    /// Decode a blob previously produced by [`DocumentIndex::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let index: DocumentIndex = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::CorruptIndex(e.to_string()))?;
        if index.version != INDEX_FORMAT_VERSION {
            return Err(PipelineError::CorruptIndex(format!(
                "unsupported index format version {}",
                index.version
            )));
        }
        Ok(index)
    }
}

/// Store key for a document's index: `<document>_<strategy>`.
pub fn make_index_key(document: &str, strategy: ScoringStrategy) -> String {
    format!("{}_{}", document, strategy)
}

/// Lowercased whitespace tokens of a text, as a sorted set.
pub fn lexical_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// Build an index over the chunk sequence.
///
/// The vocabulary (tfidf) or embedding pass (dense) is fitted once here;
/// indexes are not incrementally updatable. An empty chunk sequence is a
/// valid, queryable index.
pub async fn build(
    chunks: Vec<Chunk>,
    strategy: ScoringStrategy,
    max_features: usize,
    embedder: Option<&dyn Embedder>,
) -> Result<DocumentIndex, PipelineError> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

    let mut hasher = Sha256::new();
    for text in &texts {
        hasher.update(text.as_bytes());
    }
    let content_hash = format!("{:x}", hasher.finalize());

    let repr = match strategy {
        ScoringStrategy::Lexical => IndexRepr::Lexical {
            token_sets: texts.iter().map(|t| lexical_tokens(t)).collect(),
        },
        ScoringStrategy::Tfidf => {
            let model = TfidfModel::fit(&texts, max_features);
            let vectors = texts.iter().map(|t| model.transform(t)).collect();
            IndexRepr::Tfidf { model, vectors }
        }
        ScoringStrategy::Dense => {
            let embedder = embedder.ok_or_else(|| {
                PipelineError::Internal(anyhow::anyhow!(
                    "dense strategy requires an embedding provider"
                ))
            })?;
            let vectors = if texts.is_empty() {
                Vec::new()
            } else {
                embedder.embed(&texts).await?
            };
            IndexRepr::Dense {
                model: embedder.model_name().to_string(),
                dims: embedder.dims(),
                vectors,
            }
        }
    };

    Ok(DocumentIndex {
        version: INDEX_FORMAT_VERSION,
        index_id: Uuid::new_v4().to_string(),
        strategy,
        content_hash,
        chunks,
        repr,
    })
}
