//! Generative-model client used by the answer composer.
//!
//! The model call is the pipeline's only query-path network dependency.
//! It runs once per request with a configurable timeout and never retries
//! internally; any failure surfaces as
//! [`PipelineError::GenerationFailed`] and the whole operation fails
//! rather than producing a partial answer. Retrying is the caller's
//! decision.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::PipelineError;

/// A text-completion model invoked with a fully assembled prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier for logging.
    fn model_name(&self) -> &str;
    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}

/// Build the configured generator.
pub fn create_generator(config: &GenerationConfig) -> anyhow::Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiGenerator::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        other => anyhow::bail!("Unknown generation provider: {}", other),
    }
}

/// A generator that always fails; used when no provider is configured.
///
/// Indexing works without one, so `ask index` does not demand an API key.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
        Err(PipelineError::GenerationFailed(
            "generation provider is disabled; set [generation] provider in config".to_string(),
        ))
    }
}

/// Client for the Google Gemini `generateContent` API.
pub struct GeminiGenerator {
    model: String,
    temperature: f32,
    timeout: Duration,
    api_key: String,
}

impl GeminiGenerator {
    /// Reads the API key from the environment variable named in config.
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;
        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            api_key,
        })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PipelineError::GenerationFailed(e.to_string()))?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [ { "parts": [ { "text": prompt } ] } ],
            "generationConfig": { "temperature": self.temperature }
        });

        let response = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::GenerationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::GenerationFailed(format!(
                "model API error {}: {}",
                status, text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::GenerationFailed(e.to_string()))?;
        parse_generate_response(&json)
    }
}

/// Extract the first candidate's text parts from a `generateContent`
/// response.
fn parse_generate_response(json: &serde_json::Value) -> Result<String, PipelineError> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            PipelineError::GenerationFailed("invalid model response: no candidates".to_string())
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(PipelineError::GenerationFailed(
            "invalid model response: empty candidate text".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_joins_candidate_parts() {
        let json = serde_json::json!({
            "candidates": [ {
                "content": { "parts": [ { "text": "Dogs are loyal " }, { "text": "[Source 1]." } ] }
            } ]
        });
        assert_eq!(
            parse_generate_response(&json).unwrap(),
            "Dogs are loyal [Source 1]."
        );
    }

    #[test]
    fn parse_response_without_candidates_fails() {
        let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_generate_response(&json).unwrap_err();
        assert!(matches!(err, PipelineError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn disabled_generator_fails_with_generation_error() {
        let err = DisabledGenerator.generate("hello").await.unwrap_err();
        assert!(matches!(err, PipelineError::GenerationFailed(_)));
    }
}
