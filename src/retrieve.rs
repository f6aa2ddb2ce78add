//! Top-k chunk retrieval against a built index.
//!
//! The query is transformed with the transform persisted inside the
//! index, every chunk is scored, and the best `k` come back in rank
//! order. Ordering is deterministic: descending score, ties broken by
//! ascending `chunk_index` so the earlier chunk wins.

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::PipelineError;
use crate::index::{lexical_tokens, DocumentIndex, IndexRepr};
use crate::models::RetrievedChunk;

/// Default number of chunks handed to the answer composer.
pub const DEFAULT_TOP_K: usize = 3;

/// Score all indexed chunks against `query` and return the top `k`.
///
/// A `k` larger than the chunk count returns every chunk; an index built
/// from zero chunks returns an empty sequence. Neither is an error — an
/// empty result is a valid, queryable state.
///
/// # Errors
///
/// - [`PipelineError::VectorSpaceMismatch`] when a dense index is queried
///   without an embedding provider, with a different model, or the query
///   vector's dimensionality differs from the index.
/// - [`PipelineError::CorruptIndex`] when the stored vectors do not line
///   up one-to-one with the chunks.
pub async fn retrieve(
    index: &DocumentIndex,
    query: &str,
    k: usize,
    embedder: Option<&dyn Embedder>,
) -> Result<Vec<RetrievedChunk>, PipelineError> {
    if index.chunks.is_empty() {
        return Ok(Vec::new());
    }

    let scores = match &index.repr {
        IndexRepr::Lexical { token_sets } => {
            check_aligned(token_sets.len(), index.chunks.len())?;
            let query_tokens = lexical_tokens(query);
            token_sets
                .iter()
                .map(|set| {
                    query_tokens
                        .iter()
                        .filter(|t| set.binary_search(t).is_ok())
                        .count() as f32
                })
                .collect::<Vec<f32>>()
        }
        IndexRepr::Tfidf { model, vectors } => {
            check_aligned(vectors.len(), index.chunks.len())?;
            let query_vec = model.transform(query);
            vectors
                .iter()
                .map(|v| cosine_similarity(&query_vec, v))
                .collect()
        }
        IndexRepr::Dense {
            model,
            dims,
            vectors,
        } => {
            check_aligned(vectors.len(), index.chunks.len())?;
            let embedder = embedder.ok_or_else(|| {
                PipelineError::VectorSpaceMismatch(format!(
                    "index was built with embedding model '{}' but no embedding provider is configured",
                    model
                ))
            })?;
            if embedder.model_name() != model.as_str() {
                return Err(PipelineError::VectorSpaceMismatch(format!(
                    "index was built with embedding model '{}', configured provider is '{}'",
                    model,
                    embedder.model_name()
                )));
            }
            let query_owned = [query.to_string()];
            let query_vec = embedder
                .embed(&query_owned)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    PipelineError::Internal(anyhow::anyhow!("empty embedding response"))
                })?;
            if query_vec.len() != *dims {
                return Err(PipelineError::VectorSpaceMismatch(format!(
                    "query vector has {} dims, index has {}",
                    query_vec.len(),
                    dims
                )));
            }
            vectors
                .iter()
                .map(|v| cosine_similarity(&query_vec, v))
                .collect()
        }
    };

    let mut ranked: Vec<RetrievedChunk> = index
        .chunks
        .iter()
        .zip(scores)
        .map(|(chunk, score)| RetrievedChunk {
            chunk: chunk.clone(),
            score,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
    });
    ranked.truncate(k);

    Ok(ranked)
}

fn check_aligned(vectors: usize, chunks: usize) -> Result<(), PipelineError> {
    if vectors != chunks {
        return Err(PipelineError::CorruptIndex(format!(
            "{} vectors for {} chunks",
            vectors, chunks
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{build, ScoringStrategy};
    use crate::models::Chunk;
    use anyhow::Result;
    use async_trait::async_trait;

    fn make_chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk {
                text: t.to_string(),
                page: Some(i as u32 + 1),
                chunk_index: i,
            })
            .collect()
    }

    async fn lexical_index(texts: &[&str]) -> DocumentIndex {
        build(make_chunks(texts), ScoringStrategy::Lexical, 1000, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn two_page_scenario_retrieves_the_relevant_page() {
        let index = lexical_index(&["Cats are mammals.", "Dogs are loyal."]).await;
        let results = retrieve(&index, "Are dogs loyal?", 1, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.page, Some(2));
    }

    #[tokio::test]
    async fn top_score_dominates_the_rest() {
        let index = lexical_index(&[
            "Cats are mammals.",
            "Dogs are loyal.",
            "Birds can fly very far.",
        ])
        .await;
        let results = retrieve(&index, "are dogs loyal", 3, None).await.unwrap();
        for r in &results[1..] {
            assert!(results[0].score >= r.score);
        }
    }

    #[tokio::test]
    async fn ties_break_by_ascending_chunk_index() {
        let index = lexical_index(&["same words here", "same words here", "same words here"]).await;
        let results = retrieve(&index, "same words", 3, None).await.unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn k_beyond_chunk_count_returns_everything() {
        let index = lexical_index(&["one", "two"]).await;
        let results = retrieve(&index, "one two", 10, None).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn empty_index_returns_empty_not_error() {
        let index = build(Vec::new(), ScoringStrategy::Lexical, 1000, None)
            .await
            .unwrap();
        let results = retrieve(&index, "anything", 3, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn retrieval_is_deterministic() {
        let index = lexical_index(&["alpha beta", "beta gamma", "gamma alpha"]).await;
        let a = retrieve(&index, "alpha gamma", 3, None).await.unwrap();
        let b = retrieve(&index, "alpha gamma", 3, None).await.unwrap();
        let order_a: Vec<usize> = a.iter().map(|r| r.chunk.chunk_index).collect();
        let order_b: Vec<usize> = b.iter().map(|r| r.chunk.chunk_index).collect();
        assert_eq!(order_a, order_b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.score, y.score);
        }
    }

    #[tokio::test]
    async fn tfidf_scores_match_after_blob_round_trip() {
        let index = build(
            make_chunks(&["Cats are mammals.", "Dogs are loyal.", "Fish swim in water."]),
            ScoringStrategy::Tfidf,
            1000,
            None,
        )
        .await
        .unwrap();
        let restored = DocumentIndex::from_bytes(&index.to_bytes().unwrap()).unwrap();

        let before = retrieve(&index, "are dogs loyal", 3, None).await.unwrap();
        let after = retrieve(&restored, "are dogs loyal", 3, None).await.unwrap();
        assert_eq!(before.len(), after.len());
        for (x, y) in before.iter().zip(after.iter()) {
            assert_eq!(x.chunk.chunk_index, y.chunk.chunk_index);
            assert_eq!(x.score, y.score);
        }
    }

    struct StubEmbedder {
        model: String,
        dims: usize,
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn model_name(&self) -> &str {
            &self.model
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            // Bag-of-letters projection; deterministic and dimension-stable.
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; self.dims];
                    for b in t.bytes() {
                        v[b as usize % self.dims] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn dense_index_without_provider_is_a_space_mismatch() {
        let stub = StubEmbedder {
            model: "stub-embed".to_string(),
            dims: 8,
        };
        let index = build(
            make_chunks(&["Dogs are loyal."]),
            ScoringStrategy::Dense,
            1000,
            Some(&stub),
        )
        .await
        .unwrap();

        let err = retrieve(&index, "dogs", 3, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::VectorSpaceMismatch(_)));
    }

    #[tokio::test]
    async fn dense_index_with_different_model_is_a_space_mismatch() {
        let stub = StubEmbedder {
            model: "stub-embed".to_string(),
            dims: 8,
        };
        let index = build(
            make_chunks(&["Dogs are loyal."]),
            ScoringStrategy::Dense,
            1000,
            Some(&stub),
        )
        .await
        .unwrap();

        let other = StubEmbedder {
            model: "other-embed".to_string(),
            dims: 8,
        };
        let err = retrieve(&index, "dogs", 3, Some(&other)).await.unwrap_err();
        assert!(matches!(err, PipelineError::VectorSpaceMismatch(_)));
    }

    #[tokio::test]
    async fn dense_retrieval_ranks_by_cosine() {
        let stub = StubEmbedder {
            model: "stub-embed".to_string(),
            dims: 16,
        };
        let index = build(
            make_chunks(&["aaaa aaaa aaaa", "zzzz zzzz zzzz"]),
            ScoringStrategy::Dense,
            1000,
            Some(&stub),
        )
        .await
        .unwrap();

        let results = retrieve(&index, "aaaa", 1, Some(&stub)).await.unwrap();
        assert_eq!(results[0].chunk.chunk_index, 0);
    }
}
