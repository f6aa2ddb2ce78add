//! Answer composition: grounded prompt assembly plus the model call.
//!
//! Retrieved chunks are embedded in the prompt as `[Source i - Page p]`
//! labels in rank order, and the model is instructed to cite with
//! `[Source X]` markers. Downstream consumers parse those markers, so the
//! label format is a contract: the citation index `i` in the answer text
//! maps positionally to `sources[i - 1]`.

use crate::error::PipelineError;
use crate::generate::Generator;
use crate::models::{Answer, RetrievedChunk, SourceRef};

/// Length of the excerpt carried in each citation, in characters.
pub const EXCERPT_CHARS: usize = 200;

/// Render a page label: the number, or `Unknown` when provenance is
/// missing.
fn page_label(page: Option<u32>) -> String {
    match page {
        Some(p) => p.to_string(),
        None => "Unknown".to_string(),
    }
}

/// Assemble the grounded prompt handed to the generative model.
pub fn build_prompt(query: &str, retrieved: &[RetrievedChunk]) -> String {
    let mut context = String::new();
    for (i, r) in retrieved.iter().enumerate() {
        context.push_str(&format!(
            "[Source {} - Page {}]: {}\n\n",
            i + 1,
            page_label(r.chunk.page),
            r.chunk.text
        ));
    }

    format!(
        "Based on the following context, answer the question and include citations in your response.\n\
         Use [Source X] format to cite your sources.\n\n\
         Context:\n{}\n\
         Question: {}\n\n\
         Answer with citations:",
        context, query
    )
}

/// Citation entries in the same rank order the chunks held in the prompt.
pub fn source_refs(retrieved: &[RetrievedChunk]) -> Vec<SourceRef> {
    retrieved
        .iter()
        .map(|r| {
            let excerpt: String = r.chunk.text.chars().take(EXCERPT_CHARS).collect();
            SourceRef {
                page: r.chunk.page,
                excerpt: format!("{}...", excerpt),
            }
        })
        .collect()
}

/// Invoke the model with the assembled prompt and pair its response with
/// the rank-ordered sources.
///
/// Fails whole: a model failure surfaces
/// [`PipelineError::GenerationFailed`] and no partial [`Answer`] is
/// produced.
pub async fn compose_answer(
    generator: &dyn Generator,
    query: &str,
    retrieved: &[RetrievedChunk],
) -> Result<Answer, PipelineError> {
    let prompt = build_prompt(query, retrieved);
    tracing::debug!(model = generator.model_name(), "invoking generative model");
    let answer = generator.generate(&prompt).await?;
    Ok(Answer {
        answer,
        sources: source_refs(retrieved),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use async_trait::async_trait;

    fn retrieved(texts: &[(&str, Option<u32>)]) -> Vec<RetrievedChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, (text, page))| RetrievedChunk {
                chunk: Chunk {
                    text: text.to_string(),
                    page: *page,
                    chunk_index: i,
                },
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    struct CannedGenerator(String);

    #[async_trait]
    impl Generator for CannedGenerator {
        fn model_name(&self) -> &str {
            "canned"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        fn model_name(&self) -> &str {
            "failing"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
            Err(PipelineError::GenerationFailed("timeout".to_string()))
        }
    }

    #[test]
    fn prompt_labels_sources_in_rank_order() {
        let prompt = build_prompt(
            "Are dogs loyal?",
            &retrieved(&[("Dogs are loyal.", Some(2)), ("Cats are mammals.", Some(1))]),
        );
        assert!(prompt.contains("[Source 1 - Page 2]: Dogs are loyal."));
        assert!(prompt.contains("[Source 2 - Page 1]: Cats are mammals."));
        assert!(
            prompt.find("[Source 1").unwrap() < prompt.find("[Source 2").unwrap(),
            "sources must appear in rank order"
        );
        assert!(prompt.contains("Question: Are dogs loyal?"));
        assert!(prompt.ends_with("Answer with citations:"));
    }

    #[test]
    fn unknown_page_renders_as_unknown() {
        let prompt = build_prompt("q", &retrieved(&[("text", None)]));
        assert!(prompt.contains("[Source 1 - Page Unknown]: text"));
    }

    #[test]
    fn excerpts_truncate_at_two_hundred_chars() {
        let long = "x".repeat(500);
        let refs = source_refs(&retrieved(&[(long.as_str(), Some(1))]));
        assert_eq!(refs[0].excerpt.chars().count(), EXCERPT_CHARS + 3);
        assert!(refs[0].excerpt.ends_with("..."));
    }

    #[tokio::test]
    async fn citation_index_maps_to_sources_position() {
        let chunks = retrieved(&[
            ("Cats are mammals.", Some(1)),
            ("Dogs are loyal.", Some(2)),
            ("Fish swim.", Some(3)),
        ]);
        let gen = CannedGenerator("Yes, dogs are loyal [Source 2].".to_string());
        let answer = compose_answer(&gen, "Are dogs loyal?", &chunks).await.unwrap();

        // [Source 2] in the answer refers to sources[1], the rank-2 chunk.
        assert!(answer.answer.contains("[Source 2]"));
        assert_eq!(answer.sources[1].page, Some(2));
        assert!(answer.sources[1].excerpt.starts_with("Dogs are loyal."));
        assert_eq!(answer.sources.len(), 3);
    }

    #[tokio::test]
    async fn model_failure_produces_no_partial_answer() {
        let err = compose_answer(&FailingGenerator, "q", &retrieved(&[("t", Some(1))]))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::GenerationFailed(_)));
    }
}
