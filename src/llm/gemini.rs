// file: src/llm/gemini.rs
// description: Gemini REST integration for text embeddings and answer generation
// reference: https://ai.google.dev/api

use crate::config::GeminiConfig;
use crate::database::embeddings::{Embedder, EmbeddingTask, check_dimension};
use crate::error::{PipelineError, Result};
use crate::llm::AnswerGenerator;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    embedding_model: String,
    generation_model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;

        let mut headers = HeaderMap::new();
        let mut key_header = HeaderValue::from_str(api_key)
            .map_err(|e| PipelineError::Config(format!("Invalid Gemini API key: {}", e)))?;
        key_header.set_sensitive(true);
        headers.insert("x-goog-api-key", key_header);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// Posts `body` and decodes the JSON reply. Transport failures surface
    /// as [`PipelineError::Http`]; error statuses and undecodable replies
    /// are wrapped with `kind`.
    async fn post_json<B, R>(
        &self,
        url: &str,
        body: &B,
        kind: fn(String) -> PipelineError,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(kind(format!(
                "Gemini API request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| kind(format!("Failed to parse Gemini API response: {}", e)))
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        let request = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
            task_type: task.as_api_str(),
        };

        debug!(
            "Requesting {} embedding from Gemini for {} chars",
            task.as_api_str(),
            text.len()
        );

        let url = self.model_url(&self.embedding_model, "embedContent");
        let response: EmbedContentResponse = self
            .post_json(&url, &request, PipelineError::Embedding)
            .await?;

        let values = response.embedding.values;
        check_dimension(&values, None)?;
        debug!("Received embedding of dimension {}", values.len());
        Ok(values)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl AnswerGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = self.model_url(&self.generation_model, "generateContent");
        let response: GenerateContentResponse = self
            .post_json(&url, &request, PipelineError::Generation)
            .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(PipelineError::Generation(match response.prompt_feedback {
                Some(feedback) => format!("Gemini returned no text (prompt feedback: {})", feedback),
                None => "Gemini returned no text".to_string(),
            }));
        }

        Ok(text)
    }
}
